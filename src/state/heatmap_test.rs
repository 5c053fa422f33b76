use super::*;

#[test]
fn classify_uses_tier_thresholds() {
    assert_eq!(HeatTier::classify(0), None);
    assert_eq!(HeatTier::classify(1), Some(HeatTier::Cold));
    assert_eq!(HeatTier::classify(20), Some(HeatTier::Cold));
    assert_eq!(HeatTier::classify(21), Some(HeatTier::Warm));
    assert_eq!(HeatTier::classify(50), Some(HeatTier::Warm));
    assert_eq!(HeatTier::classify(51), Some(HeatTier::Hot));
}

#[test]
fn tier_colors() {
    assert_eq!(HeatTier::Hot.color(), "#FF4500");
    assert_eq!(HeatTier::Warm.color(), "#FFD700");
    assert_eq!(HeatTier::Cold.color(), "#1E90FF");
}

#[test]
fn merge_overwrites_values() {
    let mut cache = HeatmapCache::new();
    cache.set(HeatmapChunk::new(0, 0), 5);
    cache.merge(&[HeatValue { grid_x: 0, grid_y: 0, heat_value: 40 }]);
    assert_eq!(cache.get(HeatmapChunk::new(0, 0)), Some(40));
}

#[test]
fn bump_targets_containing_chunk() {
    let mut cache = HeatmapCache::new();
    // row 10 → grid_y 1, col -1 → grid_x -1
    assert_eq!(cache.bump(CellCoord::new(10, -1), 1), 1);
    assert_eq!(cache.get(HeatmapChunk::new(-1, 1)), Some(1));
}

#[test]
fn bump_saturates_at_zero() {
    let mut cache = HeatmapCache::new();
    cache.set(HeatmapChunk::new(0, 0), 2);
    assert_eq!(cache.bump(CellCoord::new(0, 0), -5), 0);
}

#[test]
fn clear_drops_everything() {
    let mut cache = HeatmapCache::new();
    cache.set(HeatmapChunk::new(1, 1), 9);
    cache.clear();
    assert!(cache.is_empty());
}
