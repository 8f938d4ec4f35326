//! 负载均衡等待时间估算
//!
//! 列表调度：按到达顺序把前面每位患者分配给当前累计负载最小的人员，
//! 最早空闲的人员的累计时长即为下一位患者的等待时间。
//! 累计时长在 `u32::MAX` 处饱和。

use intake_core::{IntakeError, Result};

/// 估算下一位患者开始接受服务前的等待时长（分钟）
///
/// `durations_ahead` 必须保持到达顺序，不做排序。负载相同时取下标最小者。
pub fn estimate_wait(durations_ahead: &[u32], server_count: u32) -> Result<u32> {
    if server_count == 0 {
        return Err(IntakeError::NoStaffAvailable("no servers available".into()));
    }

    // 人数多于前方人数时，多出的人员负载恒为0
    let servers = (server_count as usize).min(durations_ahead.len().max(1));
    let mut loads = vec![0u32; servers];
    for &duration in durations_ahead {
        let slot = least_loaded(&loads);
        loads[slot] = loads[slot].saturating_add(duration);
    }

    Ok(loads.iter().copied().min().unwrap_or(0))
}

/// 估算从现在到本人服务结束的总时长：等待时长加上本人的服务时长
pub fn estimate_completion(durations_ahead: &[u32], server_count: u32, own_duration: u32) -> Result<u32> {
    Ok(estimate_wait(durations_ahead, server_count)?.saturating_add(own_duration))
}

fn least_loaded(loads: &[u32]) -> usize {
    let mut best = 0;
    for (index, load) in loads.iter().enumerate() {
        if *load < loads[best] {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_balance_example() {
        // [20,0] -> [20,40] -> [40,40]
        assert_eq!(estimate_wait(&[20, 40, 20], 2).unwrap(), 40);
        assert_eq!(estimate_completion(&[20, 40, 20], 2, 20).unwrap(), 60);
    }

    #[test]
    fn test_single_server_is_sum() {
        assert_eq!(estimate_wait(&[20, 40, 70, 20], 1).unwrap(), 150);
    }

    #[test]
    fn test_empty_queue_waits_nothing() {
        assert_eq!(estimate_wait(&[], 3).unwrap(), 0);
        assert_eq!(estimate_completion(&[], 3, 70).unwrap(), 70);
    }

    #[test]
    fn test_more_servers_than_jobs() {
        assert_eq!(estimate_wait(&[70, 40], 3).unwrap(), 0);
    }

    #[test]
    fn test_arrival_order_is_preserved() {
        // 不排序：[70,20,20] 两人时为 [70,0]->[70,20]->[70,40]
        assert_eq!(estimate_wait(&[70, 20, 20], 2).unwrap(), 40);
        // 若排序为 [20,20,70] 结果会不同
        assert_eq!(estimate_wait(&[20, 20, 70], 2).unwrap(), 20);
    }

    #[test]
    fn test_deterministic() {
        let durations = [40, 20, 70, 40, 20];
        assert_eq!(
            estimate_wait(&durations, 2).unwrap(),
            estimate_wait(&durations, 2).unwrap()
        );
    }

    #[test]
    fn test_large_durations_saturate() {
        let big = 3_000_000_000;
        assert_eq!(estimate_wait(&[big, big], 1).unwrap(), u32::MAX);
        assert_eq!(estimate_completion(&[big], 1, big).unwrap(), u32::MAX);
        assert_eq!(estimate_wait(&[big, big, big], 2).unwrap(), big);
    }

    #[test]
    fn test_huge_staff_count() {
        assert_eq!(estimate_wait(&[20, 40], u32::MAX).unwrap(), 0);
        assert_eq!(estimate_wait(&[], u32::MAX).unwrap(), 0);
        assert_eq!(estimate_completion(&[20], u32::MAX, 40).unwrap(), 40);
    }

    #[test]
    fn test_zero_servers_rejected() {
        assert!(matches!(
            estimate_wait(&[20], 0),
            Err(IntakeError::NoStaffAvailable(_))
        ));
        assert!(matches!(
            estimate_wait(&[], 0),
            Err(IntakeError::NoStaffAvailable(_))
        ));
    }
}
