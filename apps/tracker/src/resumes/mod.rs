// Résumé file storage: upload persistence, replacement, removal and
// root-confined retrieval. Records only ever hold paths handed out here.

pub mod handlers;
pub mod storage;

pub use storage::ResumeStore;
