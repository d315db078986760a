fn main() {
    if let Err(e) = rvr_overlay_lib::run() {
        eprintln!("rvr-overlay: {e}");
        std::process::exit(1);
    }
}
