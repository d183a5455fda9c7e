fn main() {
    if let Err(err) = office_presence_lib::run() {
        log::error!("office-presence failed: {err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
