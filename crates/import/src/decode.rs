/// Result of decoding a raw upload buffer, with the encoding that won.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static str,
}

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Decodes a byte buffer using the prioritized encoding ladder: UTF-8 with
/// BOM, plain UTF-8, then Windows-1252 (a superset of Latin-1, which is
/// what these bank exports actually are), with a lossy UTF-8 floor.
/// Never fails — garbage in, replacement characters out.
pub fn decode_bytes(data: &[u8]) -> Decoded {
    if let Some(rest) = data.strip_prefix(&UTF8_BOM[..]) {
        if let Ok(text) = std::str::from_utf8(rest) {
            return Decoded {
                text: text.to_string(),
                encoding: "utf-8-sig",
            };
        }
    }
    if let Ok(text) = std::str::from_utf8(data) {
        return Decoded {
            text: text.to_string(),
            encoding: "utf-8",
        };
    }

    let (text, _, had_errors) = encoding_rs::WINDOWS_1252.decode(data);
    if !had_errors {
        tracing::debug!("input is not UTF-8, decoded as windows-1252");
        return Decoded {
            text: text.into_owned(),
            encoding: "windows-1252",
        };
    }

    tracing::warn!("all encodings failed, falling back to lossy UTF-8");
    Decoded {
        text: String::from_utf8_lossy(data).into_owned(),
        encoding: "utf-8-lossy",
    }
}
