use crate::error::StatsError;

pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = 120;

/// Experience at which every skill is treated as maxed, regardless of the table.
pub const SATURATION_EXPERIENCE: f64 = 500_000_000.0;

/// Cumulative experience required per level. Index 0 is level 1.
pub const LEVEL_THRESHOLDS: [u64; MAX_LEVEL as usize] = [
    0, 83, 174, 276, 388, 512,
    650, 801, 969, 1_154, 1_358, 1_584,
    1_833, 2_107, 2_411, 2_746, 3_115, 3_523,
    3_973, 4_470, 5_018, 5_624, 6_291, 7_028,
    7_842, 8_740, 9_730, 10_824, 12_031, 13_363,
    14_833, 16_456, 18_247, 20_224, 22_406, 24_815,
    27_473, 30_408, 33_648, 37_224, 41_171, 45_529,
    50_339, 55_649, 61_512, 67_983, 75_127, 83_014,
    91_721, 101_333, 111_945, 123_660, 136_594, 150_872,
    166_636, 184_040, 203_254, 224_466, 247_886, 273_742,
    302_288, 333_804, 368_599, 407_015, 449_428, 496_254,
    547_953, 605_032, 668_051, 737_627, 814_445, 899_257,
    992_895, 1_096_278, 1_210_421, 1_336_443, 1_475_581, 1_629_200,
    1_798_808, 1_986_068, 2_192_818, 2_421_087, 2_673_114, 2_951_373,
    3_258_594, 3_597_792, 3_972_294, 4_385_776, 4_842_295, 5_346_332,
    5_902_831, 6_517_253, 7_195_629, 7_944_614, 8_771_558, 9_684_577,
    10_692_629, 11_805_606, 13_034_431, 14_391_160, 15_889_109, 17_542_976,
    19_368_992, 21_385_073, 23_611_006, 26_068_632, 28_782_069, 31_777_943,
    35_085_654, 38_737_661, 42_769_801, 47_221_641, 52_136_869, 57_563_718,
    63_555_443, 70_170_840, 77_474_828, 85_539_082, 94_442_737, 104_273_167,
];

pub(crate) fn validate_experience(xp: f64) -> Result<f64, StatsError> {
    if xp.is_finite() && xp >= 0.0 {
        Ok(xp)
    } else {
        Err(StatsError::InvalidExperience(xp))
    }
}

/// Level reached with `xp` cumulative experience.
///
/// Thresholds are inclusive lower bounds: experience exactly equal to a
/// threshold reaches that level.
pub fn level_from_experience(xp: f64) -> Result<u32, StatsError> {
    let xp = validate_experience(xp)?;
    if xp >= SATURATION_EXPERIENCE {
        return Ok(MAX_LEVEL);
    }

    let mut level = MAX_LEVEL;
    while level > MIN_LEVEL && xp < threshold(level) {
        level -= 1;
    }
    Ok(level)
}

/// Cumulative experience required for `level`, or `None` outside 1..=120.
pub fn experience_for_level(level: u32) -> Option<f64> {
    if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        Some(threshold(level))
    } else {
        None
    }
}

fn threshold(level: u32) -> f64 {
    LEVEL_THRESHOLDS[(level - MIN_LEVEL) as usize] as f64
}
