//! Client-profile catalogue for the download orchestrator
//!
//! A fixed, ordered sequence of yt-dlp "client profiles" impersonating the
//! official YouTube apps. Profiles that look like a native mobile client go
//! first because they trip anti-bot challenges least often; the degraded TV
//! profile is the last resort. The same catalogue drives both the metadata
//! lookup path and the actual download path so preview and fetch behave
//! identically.

use crate::core::config;
use std::path::Path;

/// One client profile: fingerprint headers plus the extractor arguments
/// selecting that client's API surface.
#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub user_agent: &'static str,
    pub referer: &'static str,
    /// yt-dlp `--extractor-args` value, e.g. `youtube:player_client=android`
    pub extractor_args: &'static str,
    /// Format expression for this client, highest tier first
    pub format: &'static str,
    /// Whether the shared cookie file is attached when available
    pub use_cookies: bool,
}

/// Ordered catalogue. Order matters: first success wins, `tv_embedded` is
/// only reached when everything else was blocked.
pub const CATALOGUE: &[Strategy] = &[
    Strategy {
        name: "android",
        user_agent: "com.google.android.youtube/19.09.37 (Linux; U; Android 11) gzip",
        referer: "https://www.youtube.com/",
        extractor_args: "youtube:player_client=android",
        format: "bestvideo[ext=mp4][height<=1080]+bestaudio[ext=m4a]/bestvideo+bestaudio/best[height<=1080]/best",
        use_cookies: true,
    },
    Strategy {
        name: "ios",
        user_agent: "com.google.ios.youtube/19.09.3 (iPhone14,3; U; CPU iOS 15_6 like Mac OS X)",
        referer: "https://www.youtube.com/",
        extractor_args: "youtube:player_client=ios",
        format: "bestvideo[ext=mp4][height<=720]+bestaudio[ext=m4a]/bestvideo+bestaudio/best[height<=720]/best",
        use_cookies: true,
    },
    Strategy {
        name: "mweb",
        user_agent: "Mozilla/5.0 (Linux; Android 11; SM-G991B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
        referer: "https://www.youtube.com/",
        extractor_args: "youtube:player_client=mweb",
        format: "best[ext=mp4][height<=720]/bestvideo+bestaudio/best",
        use_cookies: true,
    },
    Strategy {
        name: "web",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        referer: "https://www.youtube.com/",
        extractor_args: "youtube:player_client=web",
        format: "best[height<=720]/bestvideo+bestaudio/best",
        use_cookies: true,
    },
    Strategy {
        name: "tv_embedded",
        user_agent: "Mozilla/5.0 (ChromiumStylePlatform) Cobalt/Version",
        referer: "https://www.youtube.com/",
        extractor_args: "youtube:player_client=tv_embedded",
        format: "best[height<=480]/bestvideo+bestaudio/best",
        use_cookies: true,
    },
];

impl Strategy {
    /// Effective user agent, honouring the YTDL_USER_AGENT override.
    pub fn effective_user_agent(&self) -> String {
        config::YTDL_USER_AGENT
            .clone()
            .unwrap_or_else(|| self.user_agent.to_string())
    }

    /// Fingerprint arguments shared by the info-lookup and download paths.
    pub fn fingerprint_args(&self, cookies: Option<&Path>) -> Vec<String> {
        let mut args = vec![
            "--user-agent".to_string(),
            self.effective_user_agent(),
            "--referer".to_string(),
            self.referer.to_string(),
            "--extractor-args".to_string(),
            self.extractor_args.to_string(),
            "--geo-bypass".to_string(),
            "--no-check-certificate".to_string(),
        ];
        if self.use_cookies {
            if let Some(path) = cookies {
                args.push("--cookies".to_string());
                args.push(path.to_string_lossy().to_string());
            }
        }
        args
    }

    /// Full argument list for a download attempt.
    pub fn download_args(&self, output_path: &Path, url: &str, cookies: Option<&Path>) -> Vec<String> {
        let mut args = vec![
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--format".to_string(),
            self.format.to_string(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "--socket-timeout".to_string(),
            "30".to_string(),
            "--retries".to_string(),
            "3".to_string(),
            "--fragment-retries".to_string(),
            "3".to_string(),
            "-4".to_string(),
        ];
        args.extend(self.fingerprint_args(cookies));
        args.push("-o".to_string());
        args.push(output_path.to_string_lossy().to_string());
        args.push(url.to_string());
        args
    }

    /// Full argument list for a `--dump-json` metadata probe.
    pub fn info_args(&self, url: &str, cookies: Option<&Path>) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
        ];
        args.extend(self.fingerprint_args(cookies));
        args.push(url.to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_order_is_fixed() {
        let names: Vec<&str> = CATALOGUE.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["android", "ios", "mweb", "web", "tv_embedded"]);
    }

    #[test]
    fn download_args_carry_fingerprint_and_output() {
        let strategy = &CATALOGUE[0];
        let args = strategy.download_args(Path::new("/tmp/v.mp4"), "https://www.youtube.com/watch?v=x", None);
        assert!(args.contains(&"youtube:player_client=android".to_string()));
        assert!(args.contains(&"-o".to_string()));
        assert!(args.contains(&"/tmp/v.mp4".to_string()));
        // No cookie file configured, no --cookies flag
        assert!(!args.contains(&"--cookies".to_string()));
    }

    #[test]
    fn cookie_flag_attached_when_available() {
        let strategy = &CATALOGUE[1];
        let args = strategy.info_args("https://youtu.be/x", Some(Path::new("/tmp/cookies.txt")));
        let idx = args.iter().position(|a| a == "--cookies").unwrap();
        assert_eq!(args[idx + 1], "/tmp/cookies.txt");
    }
}
