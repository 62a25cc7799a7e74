//! # 节点着色
//!
//! 节点名经 32 位 FNV-1a 哈希后对调色板取模，同一节点名在一次运行中颜色恒定。

/// 调色板大小
pub const PALETTE_SIZE: usize = 4;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32 位 FNV-1a 哈希
#[must_use]
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// 节点名对应的调色板下标
#[must_use]
pub fn color_for(node_name: &str) -> usize {
    (fnv1a_32(node_name.as_bytes()) % PALETTE_SIZE as u32) as usize
}
