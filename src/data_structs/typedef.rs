use smallstr::SmallString;

pub const SMALLSTR_SIZE: usize = 20;
pub type QcSmallStr = SmallString<[u8; SMALLSTR_SIZE]>;
pub type PosType = u64;
pub type CountType = u64;
