use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::path::Path;

/// Decoded `data:` URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Parse `data:[<mime>][;base64],<payload>`. The payload is percent-decoded
    /// first, so both `encodeURIComponent` SVG markup and plain inline markup work.
    pub fn parse(url: &str) -> Result<Self, String> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| "missing 'data:' prefix".to_string())?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| "missing ',' separator".to_string())?;

        let mut params = header.split(';');
        let mime = match params.next() {
            Some(m) if !m.is_empty() => m.to_ascii_lowercase(),
            _ => "text/plain".to_string(),
        };
        let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

        let payload = urlencoding::decode_binary(payload.as_bytes());
        let bytes = if is_base64 {
            let compact: Vec<u8> = payload
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            STANDARD
                .decode(&compact)
                .map_err(|e| format!("invalid base64 payload: {}", e))?
        } else {
            payload.into_owned()
        };

        Ok(Self { mime, bytes })
    }

    pub fn is_svg(&self) -> bool {
        self.mime == "image/svg+xml"
    }
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Read a file into a data URL, guessing the MIME type from its extension.
pub fn data_url_for_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(encode_data_url(mime.essence_str(), &bytes))
}
