//! `systest` binary

fn main() {
    systest::cli::run();
}
