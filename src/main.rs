fn main() {
    if let Err(err) = faultdesk::cli::run() {
        faultdesk::ui::eprintln_error(&err);
        std::process::exit(faultdesk::exit::exit_code(&err));
    }
}
