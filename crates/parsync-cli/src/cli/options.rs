//! Translate CLI flags into pass-through tool options.

/// `--partial` keeps partial files in place; `--bwlimit` caps each transfer.
pub fn transfer_options(partial: bool, bwlimit: Option<u64>) -> Vec<String> {
    let mut options = Vec::new();
    if partial {
        options.push("--partial".to_string());
        options.push("--inplace".to_string());
    }
    // 0 means unlimited, so it is not forwarded.
    if let Some(limit) = bwlimit.filter(|l| *l > 0) {
        options.push(format!("--bwlimit={}", limit));
    }
    options
}
