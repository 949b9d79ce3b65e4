use crate::annotations::bounding_box::BoundingBoxGeometry;
use crate::annotations::plate_group::{MatchedPlate, PlateGroup};
use crate::error::PlateEvalError;
use crate::labels::label_file::GroundTruthPlate;
use itertools::{Itertools, iproduct};
use serde::{Deserialize, Serialize};

/// How predicted plates are paired with ground truth plates.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatchingStrategy {
    /// Every (prediction, ground truth) pair over the threshold is a match. A prediction may
    /// match several ground truth plates and the other way round.
    #[default]
    Greedy,
    /// Each prediction and each ground truth plate is used at most once, best IoU first.
    OneToOne,
}

pub fn match_plates(
    groups: &[PlateGroup],
    ground_truth: &[GroundTruthPlate],
    iou_threshold: f64,
    strategy: MatchingStrategy,
) -> Result<Vec<MatchedPlate>, PlateEvalError> {
    match strategy {
        MatchingStrategy::Greedy => match_greedy(groups, ground_truth, iou_threshold),
        MatchingStrategy::OneToOne => match_one_to_one(groups, ground_truth, iou_threshold),
    }
}

fn bind(group: &PlateGroup, ground_truth_index: usize) -> MatchedPlate {
    MatchedPlate {
        plate: group.plate,
        characters: group.characters.clone(),
        ground_truth_index,
    }
}

/// Scans ground truth in stored order for every group, keeping every pair over the threshold.
fn match_greedy(
    groups: &[PlateGroup],
    ground_truth: &[GroundTruthPlate],
    iou_threshold: f64,
) -> Result<Vec<MatchedPlate>, PlateEvalError> {
    let mut matched = Vec::new();
    for group in groups {
        for (index, gt) in ground_truth.iter().enumerate() {
            if gt.bounding_box.intersection_over_union(&group.plate)? >= iou_threshold {
                matched.push(bind(group, index));
            }
        }
    }
    Ok(matched)
}

/// Assigns pairs by descending IoU, ties broken by prediction then ground truth index. The
/// result is ordered like the greedy result: by prediction, then ground truth index.
fn match_one_to_one(
    groups: &[PlateGroup],
    ground_truth: &[GroundTruthPlate],
    iou_threshold: f64,
) -> Result<Vec<MatchedPlate>, PlateEvalError> {
    let mut candidates = Vec::new();
    for (group_index, gt_index) in iproduct!(0..groups.len(), 0..ground_truth.len()) {
        let iou = ground_truth[gt_index]
            .bounding_box
            .intersection_over_union(&groups[group_index].plate)?;
        if iou >= iou_threshold {
            candidates.push((group_index, gt_index, iou));
        }
    }

    let mut group_used = vec![false; groups.len()];
    let mut gt_used = vec![false; ground_truth.len()];
    let mut pairs = Vec::new();
    for (group_index, gt_index, _) in candidates
        .into_iter()
        .sorted_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)))
    {
        if group_used[group_index] || gt_used[gt_index] {
            continue;
        }
        group_used[group_index] = true;
        gt_used[gt_index] = true;
        pairs.push((group_index, gt_index));
    }
    pairs.sort_unstable();
    Ok(pairs
        .into_iter()
        .map(|(group_index, gt_index)| bind(&groups[group_index], gt_index))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::bounding_box::BoundingBox;

    fn gt(left: i32, top: i32, right: i32, bottom: i32, plate: &str) -> GroundTruthPlate {
        GroundTruthPlate {
            bounding_box: BoundingBox::new(left, top, right, bottom).unwrap(),
            plate: plate.to_string(),
        }
    }

    fn group(left: i32, top: i32, right: i32, bottom: i32) -> PlateGroup {
        PlateGroup::new(BoundingBox::new(left, top, right, bottom).unwrap())
    }

    #[test]
    fn exact_box_matches() {
        let matched = match_plates(
            &[group(14, 71, 83, 105)],
            &[gt(14, 71, 83, 105, "FS799")],
            0.5,
            MatchingStrategy::Greedy,
        )
        .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].ground_truth_index, 0);
    }

    #[test]
    fn below_threshold_does_not_match() {
        // IoU = 1/3.
        let matched = match_plates(
            &[group(5, 0, 15, 10)],
            &[gt(0, 0, 10, 10, "A")],
            0.5,
            MatchingStrategy::Greedy,
        )
        .unwrap();
        assert!(matched.is_empty());
    }

    #[test]
    fn greedy_matches_many_to_many() {
        // Two nearly identical ground truth boxes and two nearly identical predictions.
        let truth = [gt(0, 0, 100, 50, "AB"), gt(0, 0, 100, 48, "CD")];
        let groups = [group(0, 0, 100, 49), group(1, 0, 100, 50)];
        let matched = match_plates(&groups, &truth, 0.5, MatchingStrategy::Greedy).unwrap();
        let pairs: Vec<usize> = matched.iter().map(|m| m.ground_truth_index).collect();
        assert_eq!(pairs, vec![0, 1, 0, 1]);
    }

    #[test]
    fn one_to_one_uses_each_plate_once() {
        let truth = [gt(0, 0, 100, 50, "AB"), gt(0, 0, 100, 48, "CD")];
        let groups = [group(0, 0, 100, 48), group(0, 0, 100, 50)];
        let matched = match_plates(&groups, &truth, 0.5, MatchingStrategy::OneToOne).unwrap();
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].plate, groups[0].plate);
        assert_eq!(matched[0].ground_truth_index, 1);
        assert_eq!(matched[1].plate, groups[1].plate);
        assert_eq!(matched[1].ground_truth_index, 0);
    }

    #[test]
    fn one_to_one_leaves_extra_predictions_unmatched() {
        let truth = [gt(0, 0, 100, 50, "AB")];
        let groups = [group(0, 0, 100, 49), group(0, 0, 100, 50)];
        let matched = match_plates(&groups, &truth, 0.5, MatchingStrategy::OneToOne).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].plate, groups[1].plate);
    }

    #[test]
    fn one_to_one_tie_goes_to_the_earlier_prediction() {
        // Both predictions cover 49 of the 50 rows: identical IoU.
        let truth = [gt(0, 0, 100, 50, "AB")];
        let groups = [group(0, 1, 100, 50), group(0, 0, 100, 49)];
        let matched = match_plates(&groups, &truth, 0.5, MatchingStrategy::OneToOne).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].plate, groups[0].plate);
    }

    #[test]
    fn one_to_one_tie_goes_to_the_earlier_ground_truth() {
        let truth = [gt(0, 1, 100, 50, "AB"), gt(0, 0, 100, 49, "CD")];
        let groups = [group(0, 0, 100, 50)];
        let matched = match_plates(&groups, &truth, 0.5, MatchingStrategy::OneToOne).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].ground_truth_index, 0);
    }
}
