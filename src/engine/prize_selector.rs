use crate::entities::prize_entity as prizes;
use crate::error::{AppError, AppResult};
use rand::Rng;
use rand::rngs::OsRng;

/// 按权重抽取一个奖品
///
/// 只考虑启用且 weight > 0 的奖品；概率 = weight_i / Σweight_j。
/// 使用操作系统随机源 (OsRng)，奖池对参与者可见，不能被弱随机数预测。
pub fn draw_prize(catalog: &[prizes::Model]) -> AppResult<&prizes::Model> {
    draw_prize_with(catalog, &mut OsRng)
}

/// 累积权重 + 二分查找，单次 O(log n)，不展开成重复列表
pub fn draw_prize_with<'a, R: Rng + ?Sized>(
    catalog: &'a [prizes::Model],
    rng: &mut R,
) -> AppResult<&'a prizes::Model> {
    let eligible: Vec<&prizes::Model> = catalog.iter().filter(|p| p.is_drawable()).collect();
    if eligible.is_empty() {
        return Err(AppError::NoEligiblePrizes);
    }

    let mut total: u64 = 0;
    let cumulative: Vec<u64> = eligible
        .iter()
        .map(|p| {
            total += p.weight as u64;
            total
        })
        .collect();

    let pick = rng.gen_range(0..total);
    let idx = cumulative.partition_point(|&upper| upper <= pick);
    Ok(eligible[idx])
}
