fn main() {
    docshelf_cli::init_logging();

    if let Err(error) = docshelf_cli::run(std::env::args_os()) {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}
