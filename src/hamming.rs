/// 计算两个 N 字节向量的汉明距离
#[inline(always)]
pub fn hamming<const N: usize>(va: &[u8], vb: &[u8]) -> u32 {
    match N {
        32 => hamming_32(va, vb),
        _ => hamming_naive::<N>(va, vb),
    }
}

#[inline(always)]
pub fn hamming_naive<const N: usize>(va: &[u8], vb: &[u8]) -> u32 {
    let mut sum = 0;
    for i in 0..N {
        sum += (va[i] ^ vb[i]).count_ones();
    }
    sum
}

/// ORB 描述符专用：按 4 个 u64 展开计算
#[inline(always)]
pub fn hamming_32(va: &[u8], vb: &[u8]) -> u32 {
    // 描述符不一定按 8 字节对齐，不能直接 cast_slice，先拷贝一次
    let mut a = [0u64; 4];
    let mut b = [0u64; 4];
    cast_slice_into(&mut a, &va[..32]);
    cast_slice_into(&mut b, &vb[..32]);
    (a[0] ^ b[0]).count_ones()
        + (a[1] ^ b[1]).count_ones()
        + (a[2] ^ b[2]).count_ones()
        + (a[3] ^ b[3]).count_ones()
}

#[inline(always)]
fn cast_slice_into(dst: &mut [u64; 4], src: &[u8]) {
    let dst: &mut [u8] = bytemuck::cast_slice_mut(dst.as_mut_slice());
    dst.copy_from_slice(src);
}

/// 计算向量 va 和 vb 中每个向量的汉明距离，返回距离最小的 k 个索引和距离，按距离升序排列
///
/// 距离相同时，先出现的向量排在前面
///
/// 参数：
/// - va: N 字节的向量
/// - vb: 若干个 N 字节的向量
/// - k: 返回的最近邻居数量，不超过 8
pub fn knn_hamming<const N: usize>(
    va: &[u8; N],
    vb: &[[u8; N]],
    k: usize,
) -> (Vec<usize>, Vec<u32>) {
    assert!(k <= 8, "k must be less than 8");
    let mut dis = [u32::MAX; 8];
    let mut idx = [0; 8];
    for (i, chunk) in vb.iter().enumerate() {
        let d = hamming::<N>(va, chunk);
        if k == 0 || d >= dis[0] {
            continue;
        }
        // 维护一个长度为 k 的单调递减数组，最大的元素在最前面
        // 寻找插入点时从后往前遍历，插入时把前面的元素向左移动
        for j in (0..k).rev() {
            if d < dis[j] {
                dis[..=j].rotate_left(1);
                dis[j] = d;
                idx[..=j].rotate_left(1);
                idx[j] = i;
                break;
            }
        }
    }
    idx[..k]
        .iter()
        .zip(dis[..k].iter())
        .filter(|(_, d)| **d != u32::MAX)
        .rev()
        .map(|(i, d)| (*i, *d))
        .unzip()
}

/// 把 u8 切片按 N 字节切分为描述符
pub fn as_descriptors<const N: usize>(data: &[u8]) -> Vec<[u8; N]> {
    data.chunks_exact(N).filter_map(|chunk| chunk.try_into().ok()).collect()
}
