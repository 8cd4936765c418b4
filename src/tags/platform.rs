/// Operating system and architecture of the target machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

/// macOS releases wheels are still commonly tagged for, newest first.
const MACOS_VERSIONS: &[(u32, u32)] = &[
    (14, 0),
    (13, 0),
    (12, 0),
    (11, 0),
    (10, 15),
    (10, 14),
    (10, 13),
    (10, 12),
    (10, 11),
    (10, 10),
    (10, 9),
];

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Detect the current platform
    pub fn detect() -> Self {
        Self {
            os: Self::detect_os(),
            arch: Self::detect_arch(),
        }
    }

    fn detect_os() -> String {
        #[cfg(target_os = "macos")]
        {
            "macos".to_string()
        }
        #[cfg(target_os = "linux")]
        {
            "linux".to_string()
        }
        #[cfg(target_os = "windows")]
        {
            "windows".to_string()
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            std::env::consts::OS.to_string()
        }
    }

    fn detect_arch() -> String {
        #[cfg(target_arch = "x86_64")]
        {
            "x86_64".to_string()
        }
        #[cfg(target_arch = "aarch64")]
        {
            "aarch64".to_string()
        }
        #[cfg(target_arch = "x86")]
        {
            "i686".to_string()
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "x86")))]
        {
            std::env::consts::ARCH.to_string()
        }
    }

    /// Platform tags this machine can install, most specific first.
    pub fn platform_tags(&self) -> Vec<String> {
        match (self.os.as_str(), self.arch.as_str()) {
            ("linux", arch @ ("x86_64" | "i686")) => vec![
                format!("manylinux2014_{}", arch),
                format!("manylinux2010_{}", arch),
                format!("manylinux1_{}", arch),
                format!("linux_{}", arch),
            ],
            ("linux", arch @ ("aarch64" | "ppc64le" | "s390x")) => vec![
                format!("manylinux2014_{}", arch),
                format!("linux_{}", arch),
            ],
            ("linux", arch) => vec![format!("linux_{}", arch)],
            ("macos" | "darwin", arch) => Self::macos_tags(arch),
            ("windows", "x86_64" | "amd64") => vec!["win_amd64".to_string()],
            ("windows", "i686" | "x86") => vec!["win32".to_string()],
            ("windows", "aarch64" | "arm64") => vec!["win_arm64".to_string()],
            (os, arch) => vec![format!("{}_{}", os, arch)],
        }
    }

    fn macos_tags(arch: &str) -> Vec<String> {
        let arch = if arch == "aarch64" { "arm64" } else { arch };
        let mut formats = vec![arch];
        if arch == "x86_64" {
            formats.push("intel");
        }
        formats.push("universal2");

        MACOS_VERSIONS
            .iter()
            // Apple silicon wheels start at 11.0.
            .filter(|(major, _)| arch != "arm64" || *major >= 11)
            .flat_map(|(major, minor)| {
                formats
                    .iter()
                    .map(move |format| format!("macosx_{}_{}_{}", major, minor, format))
            })
            .collect()
    }
}
