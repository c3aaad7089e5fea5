use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DECORATIONS: Vec<Regex> = vec![
        // "(2)", "[3]"
        Regex::new(r"\s*[\(\[]\s*\d{1,4}\s*[\)\]]$").unwrap(),
        // "_revised", "_revised_2", "-revised 20260101_1530"
        Regex::new(r"[\s_\-]+revised(?:[\s_\-]*\d+)*$").unwrap(),
        // "_copy", " - copy 2"
        Regex::new(r"[\s_\-]+copy(?:[\s_\-]*\d+)*$").unwrap(),
        // localized copy markers
        Regex::new(r"[\s_\-]*(?:副本|拷贝|复制|コピー|kopie|copie|copia)(?:[\s_\-]*\d+)*$").unwrap(),
        // "_v2", " v1.3"
        Regex::new(r"[\s_\-]+v\d+(?:\.\d+)*$").unwrap(),
        // trailing separators
        Regex::new(r"[\s_\-\.]+$").unwrap(),
    ];
    static ref COPY_OF_PREFIX: Regex = Regex::new(r"^copy of\s+").unwrap();
}

/// Lowercase a folder name and strip revision decorations until nothing
/// more can be removed, so `ProjX_revised(1)` and `projx` compare equal.
pub fn clean_folder_name(name: &str) -> String {
    let mut current = name.trim().to_lowercase();
    current = COPY_OF_PREFIX.replace(&current, "").into_owned();

    loop {
        let mut changed = false;
        for pattern in DECORATIONS.iter() {
            let stripped = pattern.replace(&current, "");
            if stripped.len() != current.len() {
                current = stripped.into_owned();
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    current.trim().to_string()
}
