//! Display formatting for file metadata

use chrono::{DateTime, Local};

/// Extensions that open in the preview instead of downloading
const PREVIEWABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "pdf"];

const SIZE_UNITS: &[&str] = &["Bytes", "KB", "MB", "GB", "TB"];

/// Text after the last `.`, lowercased. A name without a dot yields itself.
pub fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or(file_name)
        .to_lowercase()
}

/// Human label for an extension, e.g. "PDF Document"
pub fn file_type_label(ext: &str) -> String {
    let label = match ext {
        "jpg" | "jpeg" => "JPEG Image",
        "png" => "PNG Image",
        "gif" => "GIF Image",
        "pdf" => "PDF Document",
        "doc" | "docx" => "Word Document",
        "xls" | "xlsx" => "Excel Spreadsheet",
        "ppt" | "pptx" => "PowerPoint",
        "txt" => "Text File",
        "zip" => "ZIP Archive",
        "rar" => "RAR Archive",
        "mp3" | "wav" => "Audio File",
        "mp4" | "mov" => "Video File",
        other => return format!("{} File", other.to_uppercase()),
    };
    label.to_string()
}

/// Icon identifier for an extension
pub fn file_icon(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" | "png" | "gif" => "far fa-file-image",
        "pdf" => "far fa-file-pdf",
        "doc" | "docx" => "far fa-file-word",
        "xls" | "xlsx" => "far fa-file-excel",
        "ppt" | "pptx" => "far fa-file-powerpoint",
        "txt" => "far fa-file-alt",
        "zip" | "rar" => "far fa-file-archive",
        "mp3" | "wav" => "far fa-file-audio",
        "mp4" | "mov" => "far fa-file-video",
        _ => "far fa-file",
    }
}

pub fn is_previewable(file_name: &str) -> bool {
    PREVIEWABLE_EXTENSIONS.contains(&file_extension(file_name).as_str())
}

/// Format a byte count using base-1024 units, at most two decimals
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut scaled = bytes as f64;
    let mut exponent = 0;
    while scaled >= 1024.0 && exponent < SIZE_UNITS.len() - 1 {
        scaled /= 1024.0;
        exponent += 1;
    }
    let rounded = (scaled * 100.0).round() / 100.0;

    let mut number = format!("{:.2}", rounded);
    while number.ends_with('0') {
        number.pop();
    }
    if number.ends_with('.') {
        number.pop();
    }
    format!("{} {}", number, SIZE_UNITS[exponent])
}

/// Render an RFC 3339 timestamp in local time
pub fn format_timestamp(raw: Option<&str>) -> String {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}
