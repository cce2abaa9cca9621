fn main() {
    if let Err(err) = client_import::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
