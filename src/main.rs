fn main() {
    if let Err(err) = lurnip_import::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
