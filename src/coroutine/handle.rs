use std::fmt::{Debug, Display, Formatter};

/// 协程句柄：`(槽位索引 << 32) | 世代`。
///
/// 世代永不为 0，因此 0 被保留为"无协程"哨兵值（[`CoroutineId::NONE`]）。
/// 槽位被回收复用后世代改变，旧句柄即失效，以此防止 ABA 误命中。
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_support", derive(serde::Serialize, serde::Deserialize))]
pub struct CoroutineId(u64);

impl CoroutineId {
    /// 不指向任何协程的哨兵句柄。
    pub const NONE: CoroutineId = CoroutineId(0);

    pub(crate) fn from_parts(index: u32, generation: u32) -> Self {
        debug_assert!(generation != 0);
        CoroutineId(((index as u64) << 32) | generation as u64)
    }

    /// 句柄内嵌的槽位索引。
    pub fn index(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// 句柄内嵌的世代，live 句柄恒非 0。
    pub fn generation(&self) -> u32 {
        self.0 as u32
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl Debug for CoroutineId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "CoroutineId(none)")
        } else {
            write!(
                f,
                "CoroutineId(index: {}, generation: {})",
                self.index(),
                self.generation()
            )
        }
    }
}

impl Display for CoroutineId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
