fn main() {
    if let Err(e) = xray_lens_lib::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
