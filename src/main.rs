fn main() {
    principal_errors::cli::run();
}
