use crate::graphql::sdl;

pub fn run() {
    println!("{}", sdl());
}
