//! Generation of the ordered supported-tag list for an interpreter.

use super::{Tag, TagList};

/// ABIs an interpreter provides natively, e.g. `cp312` for CPython 3.12.
pub fn default_abis(implementation: &str, major: u64, minor: u64) -> Vec<String> {
    match implementation {
        // CPython before 3.8 built with pymalloc by default.
        "cp" if major == 3 && minor < 8 => vec![format!("cp{}{}m", major, minor)],
        "cp" => vec![format!("cp{}{}", major, minor)],
        _ => Vec::new(),
    }
}

/// Build the supported-tag list, most preferred first.
///
/// The order is: the exact interpreter with each ABI (native ABIs, then
/// `abi3` for CPython, then `none`) on each platform; `abi3` builds for older
/// CPython minors; pure major-version builds per platform; the exact and
/// major-only interpreter with `none-any`; finally `py<ver>-none-any` for every
/// minor down to zero.
pub fn supported_tags(
    implementation: &str,
    python: (u64, u64),
    abis: &[String],
    platforms: &[String],
) -> TagList {
    let (major, minor) = python;
    let interpreter = format!("{}{}{}", implementation, major, minor);
    let is_cpython = implementation == "cp";

    let mut all_abis: Vec<&str> = abis.iter().map(String::as_str).collect();
    if is_cpython && !all_abis.contains(&"abi3") {
        all_abis.push("abi3");
    }
    if !all_abis.contains(&"none") {
        all_abis.push("none");
    }

    let mut tags = Vec::new();

    for abi in &all_abis {
        for platform in platforms {
            tags.push(Tag::new(&interpreter, abi, platform));
        }
    }

    if is_cpython && major == 3 {
        // abi3 arrived in 3.2.
        for older in (2..minor).rev() {
            let older_interpreter = format!("cp{}{}", major, older);
            for platform in platforms {
                tags.push(Tag::new(&older_interpreter, "abi3", platform));
            }
        }
    }

    for platform in platforms {
        tags.push(Tag::new(&format!("py{}", major), "none", platform));
    }

    tags.push(Tag::new(&interpreter, "none", "any"));
    tags.push(Tag::new(&format!("{}{}", implementation, major), "none", "any"));

    for older in (0..=minor).rev() {
        tags.push(Tag::new(&format!("py{}{}", major, older), "none", "any"));
        if older == minor {
            tags.push(Tag::new(&format!("py{}", major), "none", "any"));
        }
    }

    TagList::new(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux() -> Vec<String> {
        vec!["manylinux1_x86_64".to_string(), "linux_x86_64".to_string()]
    }

    #[test]
    fn test_default_abis() {
        assert_eq!(default_abis("cp", 3, 7), vec!["cp37m"]);
        assert_eq!(default_abis("cp", 3, 12), vec!["cp312"]);
        assert!(default_abis("pp", 3, 10).is_empty());
    }

    #[test]
    fn test_exact_native_tag_is_first() {
        let tags = supported_tags("cp", (3, 8), &default_abis("cp", 3, 8), &linux());
        assert_eq!(
            tags.iter().next(),
            Some(&Tag::new("cp38", "cp38", "manylinux1_x86_64"))
        );
    }

    #[test]
    fn test_ordering_of_generic_tags() {
        let tags = supported_tags("cp", (3, 8), &default_abis("cp", 3, 8), &linux());
        let pos = |s: &str| tags.position(&s.parse().unwrap()).unwrap();

        assert!(pos("cp38-cp38-linux_x86_64") < pos("cp38-abi3-manylinux1_x86_64"));
        assert!(pos("cp38-abi3-linux_x86_64") < pos("cp38-none-manylinux1_x86_64"));
        assert!(pos("cp38-none-linux_x86_64") < pos("cp37-abi3-manylinux1_x86_64"));
        assert!(pos("cp32-abi3-linux_x86_64") < pos("py3-none-manylinux1_x86_64"));
        assert!(pos("py3-none-linux_x86_64") < pos("cp38-none-any"));
        assert!(pos("cp3-none-any") < pos("py38-none-any"));
        assert!(pos("py38-none-any") < pos("py3-none-any"));
        assert!(pos("py3-none-any") < pos("py37-none-any"));
        assert!(pos("py31-none-any") < pos("py30-none-any"));
    }

    #[test]
    fn test_no_abi3_for_other_implementations() {
        let tags = supported_tags("pp", (3, 10), &["pypy310_pp73".to_string()], &linux());
        assert!(!tags.iter().any(|t| t.abi() == "abi3"));
        assert!(tags.position(&Tag::new("pp310", "pypy310_pp73", "linux_x86_64")).is_some());
    }
}
