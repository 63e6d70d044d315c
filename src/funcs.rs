/*
Copyright 2017 Takashi Ogura

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/
use crate::errors::*;
use rand::Rng;
use std::f64::consts::PI;

/// Euclidean distance between two joint-space states
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert!(a.len() == b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x - *y) * (*x - *y))
        .sum::<f64>()
        .sqrt()
}

/// Linear interpolation between two states at `t` in [0, 1]
pub fn interpolate(from: &[f64], to: &[f64], t: f64, out: &mut Vec<f64>) {
    debug_assert!(from.len() == to.len());
    out.clear();
    out.extend(
        from.iter()
            .zip(to.iter())
            .map(|(v1, v2)| *v1 + (*v2 - *v1) * t),
    );
}

/// Generate a random state from the optional limits
///
/// If the limit is None, -PI <-> PI is used.
pub fn random_state_from_limits<R>(rng: &mut R, limits: &[Option<k::joint::Range<f64>>]) -> Vec<f64>
where
    R: Rng,
{
    limits
        .iter()
        .map(|range| match range {
            Some(range) if range.max > range.min => rng.gen_range(range.min..range.max),
            Some(range) => range.min,
            None => rng.gen_range(-PI..PI),
        })
        .collect()
}

/// Clamp a state to set values safely
pub fn clamped_state_from_limits(values: &[f64], limits: &[Option<k::joint::Range<f64>>]) -> Result<Vec<f64>> {
    if values.len() != limits.len() {
        return Err(Error::from("size mismatch of input values and limits"));
    }
    Ok(limits
        .iter()
        .zip(values.iter())
        .map(|(range, value)| match range {
            Some(range) => {
                if *value > range.max {
                    range.max
                } else if *value < range.min {
                    range.min
                } else {
                    *value
                }
            }
            None => *value,
        })
        .collect())
}

/// Check that every value is within its limit, if one is set
pub fn satisfies_limits(values: &[f64], limits: &[Option<k::joint::Range<f64>>]) -> bool {
    values.len() == limits.len()
        && limits.iter().zip(values.iter()).all(|(range, value)| match range {
            Some(range) => *value >= range.min && *value <= range.max,
            None => true,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_and_clamped() {
        let limits: Vec<Option<k::joint::Range<f64>>> = vec![
            None,
            Some(k::joint::Range::new(-1.0, 1.0)),
            Some(k::joint::Range::new(0.0, 0.1)),
        ];
        let mut rng = StdRng::from_entropy();
        for _ in 0..1000 {
            let state = random_state_from_limits(&mut rng, &limits);
            assert_eq!(state.len(), limits.len());
            assert!(state[0] >= -PI && state[0] < PI);
            assert!(state[1] >= -1.0 && state[1] < 1.0);
            assert!(state[2] >= 0.0 && state[2] < 0.1);
            assert!(satisfies_limits(&state, &limits));
        }
        let short = vec![0.1];
        assert!(clamped_state_from_limits(&short, &limits).is_err());

        let values = vec![100.0, -2.0, 0.5];
        let clamped = clamped_state_from_limits(&values, &limits).unwrap();
        const TOLERANCE: f64 = 0.00001;
        assert!((clamped[0] - 100.0).abs() < TOLERANCE);
        assert!((clamped[1] - (-1.0)).abs() < TOLERANCE);
        assert!((clamped[2] - 0.1).abs() < TOLERANCE);
        assert!(!satisfies_limits(&values, &limits));
    }

    #[test]
    fn test_distance_and_interpolate() {
        let a = vec![0.0, 0.0];
        let b = vec![3.0, 4.0];
        assert!((distance(&a, &b) - 5.0).abs() < 1e-12);
        let mut mid = Vec::new();
        interpolate(&a, &b, 0.5, &mut mid);
        assert_eq!(mid, vec![1.5, 2.0]);
    }
}
