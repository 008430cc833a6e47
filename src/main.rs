fn main() {
    if let Err(e) = vault_tree_search::run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
