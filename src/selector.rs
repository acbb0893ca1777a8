use crate::error::AppError;
use crate::models::{FormatOption, RawFormat};

/// Container extensions the listing exposes.
const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "m4a"];

/// Container extensions acceptable as the audio half of a merged download.
const AUDIO_PAIR_EXTENSIONS: &[&str] = &["m4a", "mp4"];

/// Builds the `/formats` listing: the single best representative format per
/// resolution tier, with combined video+audio sizes for video-only entries.
///
/// Formats whose extension is outside the allow-list or whose filesize is
/// unknown are dropped entirely, even when they are the only candidate at a
/// resolution. Output order is first-seen resolution order, not resolution
/// rank. Both quirks match the upstream listing this API replaced.
pub fn list_best_formats(formats: &[RawFormat]) -> Vec<FormatOption> {
    // yt-dlp lists formats ascending by quality, so a reverse scan finds the
    // best audio track first.
    let best_audio = formats.iter().rev().find(|f| {
        f.is_audio_only() && f.filesize.is_some() && ALLOWED_EXTENSIONS.contains(&f.ext.as_str())
    });

    // Keyed by height; all audio-only entries share the `None` slot. A Vec
    // keeps first-seen insertion order, which the response order follows.
    let mut best_by_height: Vec<(Option<u32>, u64, FormatOption)> = Vec::new();

    for fmt in formats {
        if !ALLOWED_EXTENSIONS.contains(&fmt.ext.as_str()) {
            continue;
        }
        let Some(filesize) = fmt.filesize else {
            continue;
        };

        let has_audio = fmt.has_audio();
        let has_video = fmt.has_video();

        let resolution = fmt
            .format_note
            .clone()
            .filter(|note| !note.is_empty())
            .unwrap_or_else(|| match fmt.height {
                Some(height) => format!("{height}p"),
                None => "audiop".to_string(),
            });

        // A video-only entry will be merged with the best audio track on
        // download, so its advertised size includes that track.
        let mut total_size = filesize;
        if has_video && !has_audio {
            if let Some(audio) = best_audio {
                total_size += audio.filesize.unwrap_or(0);
            }
        }

        let option = FormatOption {
            format_id: fmt.format_id.clone(),
            ext: fmt.ext.clone(),
            resolution,
            filesize_mb: round_mb(total_size),
            fps: fmt.fps,
            has_audio: has_audio || (has_video && best_audio.is_some()),
            has_video,
            height: fmt.height,
        };

        match best_by_height.iter_mut().find(|(key, _, _)| *key == fmt.height) {
            Some(slot) => {
                if total_size > slot.1 {
                    *slot = (fmt.height, total_size, option);
                }
            }
            None => best_by_height.push((fmt.height, total_size, option)),
        }
    }

    best_by_height.into_iter().map(|(_, _, option)| option).collect()
}

/// Resolves a client-chosen format id into the spec handed to the downloader.
///
/// A format with video but no audio is paired with the last audio-only m4a/mp4
/// entry in the list (reverse scan, so the best track under yt-dlp's
/// ascending ordering), producing a "video+audio" merge spec.
pub fn resolve_download_spec(formats: &[RawFormat], format_id: &str) -> Result<String, AppError> {
    let selected = formats
        .iter()
        .find(|f| f.format_id == format_id)
        .ok_or(AppError::InvalidFormat)?;

    if selected.has_video() && !selected.has_audio() {
        let best_audio = formats
            .iter()
            .rev()
            .find(|f| f.is_audio_only() && AUDIO_PAIR_EXTENSIONS.contains(&f.ext.as_str()))
            .ok_or(AppError::NoSuitableAudio)?;

        Ok(format!("{}+{}", format_id, best_audio.format_id))
    } else {
        Ok(format_id.to_string())
    }
}

fn round_mb(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 / 1024.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_format(id: &str, height: u32, filesize: Option<u64>) -> RawFormat {
        RawFormat {
            format_id: id.to_string(),
            ext: "mp4".to_string(),
            format_note: None,
            fps: Some(30.0),
            vcodec: "avc1.4d401f".to_string(),
            acodec: "none".to_string(),
            height: Some(height),
            filesize,
        }
    }

    fn audio_format(id: &str, ext: &str, filesize: Option<u64>) -> RawFormat {
        RawFormat {
            format_id: id.to_string(),
            ext: ext.to_string(),
            format_note: None,
            fps: None,
            vcodec: "none".to_string(),
            acodec: "mp4a.40.2".to_string(),
            height: None,
            filesize,
        }
    }

    fn muxed_format(id: &str, height: u32, filesize: Option<u64>) -> RawFormat {
        RawFormat {
            acodec: "mp4a.40.2".to_string(),
            ..video_format(id, height, filesize)
        }
    }

    #[test]
    fn one_entry_per_resolution_keeps_largest() {
        let formats = vec![
            video_format("247", 720, Some(10_000_000)),
            video_format("398", 720, Some(30_000_000)),
            video_format("137", 1080, Some(50_000_000)),
        ];

        let listing = list_best_formats(&formats);

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].format_id, "398");
        assert_eq!(listing[1].format_id, "137");
    }

    #[test]
    fn video_only_entry_combines_audio_size() {
        // The worked example from the API contract: 500000 + 50000 bytes.
        let formats = vec![
            video_format("137", 1080, Some(500_000)),
            audio_format("140", "m4a", Some(50_000)),
        ];

        let listing = list_best_formats(&formats);

        let video = listing.iter().find(|f| f.format_id == "137").unwrap();
        assert!(video.has_audio, "merged-on-download entries advertise audio");
        assert!(video.has_video);
        assert_eq!(video.filesize_mb, 0.52);
    }

    #[test]
    fn formats_without_filesize_are_dropped() {
        let formats = vec![
            video_format("247", 720, None),
            video_format("137", 1080, Some(50_000_000)),
        ];

        let listing = list_best_formats(&formats);

        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].format_id, "137");
    }

    #[test]
    fn disallowed_extensions_are_filtered() {
        let mut webm = video_format("248", 1080, Some(40_000_000));
        webm.ext = "webm".to_string();
        let formats = vec![webm, video_format("137", 1080, Some(30_000_000))];

        let listing = list_best_formats(&formats);

        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].format_id, "137");
    }

    #[test]
    fn listing_pairs_with_last_audio_entry() {
        // Two audio candidates; the reverse scan must pick the later (better)
        // one for combined size calculations.
        let formats = vec![
            audio_format("139", "m4a", Some(1_000_000)),
            audio_format("140", "m4a", Some(2_000_000)),
            video_format("137", 1080, Some(10_000_000)),
        ];

        let listing = list_best_formats(&formats);

        let video = listing.iter().find(|f| f.format_id == "137").unwrap();
        assert_eq!(video.filesize_mb, round_mb(12_000_000));
    }

    #[test]
    fn resolution_label_prefers_format_note() {
        let mut noted = video_format("137", 1080, Some(1_000_000));
        noted.format_note = Some("1080p60".to_string());
        let plain = video_format("398", 720, Some(1_000_000));

        let listing = list_best_formats(&[noted, plain]);

        assert_eq!(listing[0].resolution, "1080p60");
        assert_eq!(listing[1].resolution, "720p");
    }

    #[test]
    fn audio_only_entries_share_one_slot() {
        let formats = vec![
            audio_format("139", "m4a", Some(1_000_000)),
            audio_format("140", "m4a", Some(2_000_000)),
        ];

        let listing = list_best_formats(&formats);

        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].format_id, "140");
        assert!(!listing[0].has_video);
    }

    #[test]
    fn resolve_unknown_id_is_invalid_format() {
        let formats = vec![muxed_format("18", 360, Some(1_000_000))];

        let err = resolve_download_spec(&formats, "999").unwrap_err();

        assert!(matches!(err, AppError::InvalidFormat));
    }

    #[test]
    fn resolve_muxed_id_is_returned_unchanged() {
        let formats = vec![
            muxed_format("18", 360, Some(1_000_000)),
            audio_format("140", "m4a", Some(50_000)),
        ];

        let spec = resolve_download_spec(&formats, "18").unwrap();

        assert_eq!(spec, "18");
    }

    #[test]
    fn resolve_video_only_pairs_with_audio() {
        let formats = vec![
            video_format("137", 1080, Some(500_000)),
            audio_format("140", "m4a", Some(50_000)),
        ];

        let spec = resolve_download_spec(&formats, "137").unwrap();

        assert_eq!(spec, "137+140");
    }

    #[test]
    fn resolve_pairs_with_last_matching_audio() {
        let formats = vec![
            audio_format("139", "m4a", Some(1_000_000)),
            audio_format("140", "m4a", Some(2_000_000)),
            video_format("137", 1080, Some(10_000_000)),
        ];

        let spec = resolve_download_spec(&formats, "137").unwrap();

        assert_eq!(spec, "137+140");
    }

    #[test]
    fn resolve_ignores_audio_in_disallowed_container() {
        let mut opus = audio_format("251", "webm", Some(1_000_000));
        opus.acodec = "opus".to_string();
        let formats = vec![opus, video_format("137", 1080, Some(10_000_000))];

        let err = resolve_download_spec(&formats, "137").unwrap_err();

        assert!(matches!(err, AppError::NoSuitableAudio));
    }

    #[test]
    fn resolve_does_not_require_audio_filesize() {
        // The download pairing scan is laxer than the listing scan: a sizeless
        // audio track is still a valid merge partner.
        let formats = vec![
            audio_format("140", "m4a", None),
            video_format("137", 1080, Some(10_000_000)),
        ];

        let spec = resolve_download_spec(&formats, "137").unwrap();

        assert_eq!(spec, "137+140");
    }

    #[test]
    fn listing_filter_does_not_restrict_downloads() {
        // A sizeless video format never appears in the listing, but stays a
        // perfectly valid download target.
        let formats = vec![
            video_format("137", 1080, None),
            audio_format("140", "m4a", Some(50_000)),
        ];

        assert!(list_best_formats(&formats)
            .iter()
            .all(|f| f.format_id != "137"));
        assert_eq!(resolve_download_spec(&formats, "137").unwrap(), "137+140");
    }
}
