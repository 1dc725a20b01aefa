fn main() {
    std::process::exit(cagestats::cli::run());
}
