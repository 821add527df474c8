use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {column} value '{value}' (expected one of: {expected})")]
pub struct UnknownLevel {
    pub column: &'static str,
    pub value: String,
    pub expected: String,
}

macro_rules! level_enum {
    ($name:ident, $column:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownLevel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|level| trimmed.eq_ignore_ascii_case(level.as_str()))
                    .ok_or_else(|| UnknownLevel {
                        column: $column,
                        value: trimmed.to_string(),
                        expected: $name::ALL
                            .iter()
                            .map(|level| level.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

level_enum!(Category, "category", {
    Intergenic => "intergenic",
    Intragenic => "intragenic",
});

level_enum!(Direction, "direction", {
    Sense => "sense",
    Antisense => "antisense",
});

level_enum!(HostAgeCat, "host_age_cat", {
    Intergenic => "intergenic",
    Ancestral => "ancestral",
    Novel => "novel",
});

level_enum!(AgeBin, "age_bin", {
    One => "1",
    TwoToFour => "2_4",
    FiveToSix => "5_6",
    SevenToTwelve => "7_12",
});

level_enum!(ObsSim, "obs_sim", {
    InterObs => "inter_obs",
    InterSim => "inter_sim",
    IntraAncObs => "intra_anc_obs",
    IntraAncSim => "intra_anc_sim",
    IntraNovObs => "intra_nov_obs",
    IntraNovSim => "intra_nov_sim",
});

/// Values accepted for "no direction" on intergenic rows.
pub fn is_missing_token(raw: &str) -> bool {
    matches!(raw.trim(), "" | "NA" | "na" | "." | "-")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub category: Category,
    pub direction: Option<Direction>,
    pub host_age_cat: HostAgeCat,
    pub age_bin: AgeBin,
    pub obs_sim: ObsSim,
    pub phylop_score: f64,
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/record.rs"]
mod tests;
