fn main() {
    std::process::exit(pax_cli::cli::run_from_env());
}
