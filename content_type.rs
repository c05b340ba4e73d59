use std::path::Path;

pub const CONTENT_TYPE_BINARY: &str = "application/octet-stream";
pub const CONTENT_TYPE_MODEL_FBX: &str = "model/fbx";
pub const CONTENT_TYPE_MODEL_USD: &str = "model/usd";

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("fbx", CONTENT_TYPE_MODEL_FBX),
    ("usd", CONTENT_TYPE_MODEL_USD),
    ("usda", CONTENT_TYPE_MODEL_USD),
    ("usdc", CONTENT_TYPE_MODEL_USD),
    ("usdz", "model/vnd.usdz+zip"),
    ("glb", "model/gltf-binary"),
    ("gltf", "model/gltf+json"),
    ("obj", "model/obj"),
];

/// Map the file name's final extension to a MIME type.
pub fn content_type_for(path: impl AsRef<Path>) -> &'static str {
    let name = match path.as_ref().file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return CONTENT_TYPE_BINARY,
    };

    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => return CONTENT_TYPE_BINARY,
    };

    CONTENT_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, content_type)| *content_type)
        .unwrap_or(CONTENT_TYPE_BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(content_type_for("model.fbx"), "model/fbx");
        assert_eq!(content_type_for("/scenes/stage.usd"), "model/usd");
        assert_eq!(content_type_for("Shoe.USDZ"), "model/vnd.usdz+zip");
    }

    #[test]
    fn test_only_last_extension_counts() {
        assert_eq!(content_type_for("archive.fbx.gz"), CONTENT_TYPE_BINARY);
        assert_eq!(content_type_for("scene.v2.fbx"), "model/fbx");
    }

    #[test]
    fn test_unknown_or_missing_extension() {
        assert_eq!(content_type_for("README"), CONTENT_TYPE_BINARY);
        assert_eq!(content_type_for("texture.png"), CONTENT_TYPE_BINARY);
        assert_eq!(content_type_for("trailing."), CONTENT_TYPE_BINARY);
        assert_eq!(content_type_for(""), CONTENT_TYPE_BINARY);
    }
}
