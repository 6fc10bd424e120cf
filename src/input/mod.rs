//! Skill list readers and caller-side label normalization

pub mod file_detector;
pub mod normalizer;
pub mod skill_list;

pub use normalizer::SkillNormalizer;
pub use skill_list::SkillListReader;
