use camino::Utf8PathBuf;
use homedir::my_home;
use tracing::{debug, instrument, warn};

#[instrument(fields(home_dir_str, expanded_path))]
pub fn make_utf8_path_buf_respect_tilde(path_candidate: &str) -> Utf8PathBuf {
    let span = tracing::Span::current();
    let Some(path_without_tilde) = path_candidate.strip_prefix('~') else {
        debug!("Path does not start with '~', returning as is");
        return Utf8PathBuf::from(path_candidate);
    };

    if let Some(home_dir) = my_home().ok().flatten() {
        if let Some(home_dir_str) = home_dir.to_str() {
            span.record("home_dir_str", home_dir_str);

            let expanded_path = format!("{home_dir_str}{path_without_tilde}");
            span.record("expanded_path", &expanded_path);

            debug!("Expanded path with home directory");
            return Utf8PathBuf::from(expanded_path);
        }
    }

    warn!("Failed to get home directory, the path will be returned as is");
    Utf8PathBuf::from(path_candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_are_untouched() {
        assert_eq!(
            make_utf8_path_buf_respect_tilde("presets/live.syx"),
            Utf8PathBuf::from("presets/live.syx")
        );
    }

    #[test]
    fn tilde_is_replaced() {
        let expanded = make_utf8_path_buf_respect_tilde("~/live.syx");
        assert!(expanded.as_str().ends_with("/live.syx"));
        if my_home().ok().flatten().is_some() {
            assert!(!expanded.as_str().starts_with('~'));
        }
    }
}
