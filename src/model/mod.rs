//! Value types shared by the evaluators and the finder.

mod archive;
mod candidate;
mod hashes;
mod link;
mod name;
mod requirement;

pub use archive::{ArchiveName, BuildTag, Format, UnparsableName};
pub use candidate::InstallationCandidate;
pub use hashes::{HASH_ALGORITHMS, Hashes};
pub use link::{Link, LinkHash, Scheme};
pub use name::canonicalize_name;
pub use requirement::Requirement;
