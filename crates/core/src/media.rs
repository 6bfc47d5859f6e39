//! Media and entity URL helpers.

use md5::{Digest, Md5};

/// Namespace used for media hosted on Wikimedia Commons.
pub const COMMONS: &str = "commons";

/// Normalize an image reference into a bare file name.
///
/// Accepts the shapes found across the APIs: `Foo bar.jpg`,
/// `File:Foo bar.jpg`, `[[Image:Foo bar.jpg|thumb|A caption]]`.
pub fn file_name(file: &str) -> String {
    let file = file.trim().trim_start_matches("[[").trim_end_matches("]]");
    let file = file.split('|').next().unwrap_or_default().trim();

    let file = match file.split_once(':') {
        Some((prefix, rest)) if matches!(prefix.to_lowercase().as_str(), "file" | "image") => rest.trim(),
        _ => file,
    };

    let name = file.replace(' ', "_");
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Upload URL of a media file, derived from the MD5 of its name.
///
/// `namespace` is `commons` for shared media, or a language code for media
/// uploaded to one wiki only.
pub fn media_url(file: &str, namespace: &str) -> String {
    let name = file_name(file);
    let hash = format!("{:x}", Md5::digest(name.as_bytes()));

    format!(
        "https://upload.wikimedia.org/wikipedia/{}/{}/{}/{}",
        namespace,
        &hash[..1],
        &hash[..2],
        name
    )
}

/// Canonical Wikidata URL of an entity.
pub fn wikidata_url(wikibase: &str) -> String {
    format!("https://www.wikidata.org/wiki/{}", wikibase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_plain() {
        assert_eq!(file_name("Ada Lovelace portrait.jpg"), "Ada_Lovelace_portrait.jpg");
    }

    #[test]
    fn test_file_name_wikilink_with_options() {
        assert_eq!(file_name("[[File:Example.jpg|thumb|upright]]"), "Example.jpg");
        assert_eq!(file_name("Image: example.jpg"), "Example.jpg");
    }

    #[test]
    fn test_file_name_keeps_other_colons() {
        assert_eq!(file_name("Map: Europe.png"), "Map:_Europe.png");
    }

    #[test]
    fn test_media_url_commons() {
        assert_eq!(
            media_url("Ada Lovelace portrait.jpg", COMMONS),
            "https://upload.wikimedia.org/wikipedia/commons/a/a4/Ada_Lovelace_portrait.jpg"
        );
    }

    #[test]
    fn test_media_url_language_namespace() {
        assert_eq!(
            media_url("File:Example.jpg", "en"),
            "https://upload.wikimedia.org/wikipedia/en/a/a9/Example.jpg"
        );
    }

    #[test]
    fn test_wikidata_url() {
        assert_eq!(wikidata_url("Q7259"), "https://www.wikidata.org/wiki/Q7259");
    }
}
