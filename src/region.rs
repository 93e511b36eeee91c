//! Japanese prefecture and region tables, and grouping of bookstores by them.

use serde::Serialize;
use std::fmt;

use crate::types::Bookstore;

/// A prefecture with its two-digit JIS code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prefecture {
    pub code: &'static str,
    pub name: &'static str,
}

const fn pref(code: &'static str, name: &'static str) -> Prefecture {
    Prefecture { code, name }
}

/// All 47 prefectures in JIS code order
pub static PREFECTURES: [Prefecture; 47] = [
    pref("01", "北海道"),
    pref("02", "青森県"),
    pref("03", "岩手県"),
    pref("04", "宮城県"),
    pref("05", "秋田県"),
    pref("06", "山形県"),
    pref("07", "福島県"),
    pref("08", "茨城県"),
    pref("09", "栃木県"),
    pref("10", "群馬県"),
    pref("11", "埼玉県"),
    pref("12", "千葉県"),
    pref("13", "東京都"),
    pref("14", "神奈川県"),
    pref("15", "新潟県"),
    pref("16", "富山県"),
    pref("17", "石川県"),
    pref("18", "福井県"),
    pref("19", "山梨県"),
    pref("20", "長野県"),
    pref("21", "岐阜県"),
    pref("22", "静岡県"),
    pref("23", "愛知県"),
    pref("24", "三重県"),
    pref("25", "滋賀県"),
    pref("26", "京都府"),
    pref("27", "大阪府"),
    pref("28", "兵庫県"),
    pref("29", "奈良県"),
    pref("30", "和歌山県"),
    pref("31", "鳥取県"),
    pref("32", "島根県"),
    pref("33", "岡山県"),
    pref("34", "広島県"),
    pref("35", "山口県"),
    pref("36", "徳島県"),
    pref("37", "香川県"),
    pref("38", "愛媛県"),
    pref("39", "高知県"),
    pref("40", "福岡県"),
    pref("41", "佐賀県"),
    pref("42", "長崎県"),
    pref("43", "熊本県"),
    pref("44", "大分県"),
    pref("45", "宮崎県"),
    pref("46", "鹿児島県"),
    pref("47", "沖縄県"),
];

pub fn prefecture_by_code(code: &str) -> Option<&'static Prefecture> {
    PREFECTURES.iter().find(|p| p.code == code)
}

pub fn prefecture_by_name(name: &str) -> Option<&'static Prefecture> {
    PREFECTURES.iter().find(|p| p.name == name)
}

/// The eight traditional regions of Japan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Hokkaido,
    Tohoku,
    Kanto,
    Chubu,
    Kinki,
    Chugoku,
    Shikoku,
    Kyushu,
}

impl Region {
    pub const ALL: [Region; 8] = [
        Self::Hokkaido,
        Self::Tohoku,
        Self::Kanto,
        Self::Chubu,
        Self::Kinki,
        Self::Chugoku,
        Self::Shikoku,
        Self::Kyushu,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Hokkaido => "hokkaido",
            Self::Tohoku => "tohoku",
            Self::Kanto => "kanto",
            Self::Chubu => "chubu",
            Self::Kinki => "kinki",
            Self::Chugoku => "chugoku",
            Self::Shikoku => "shikoku",
            Self::Kyushu => "kyushu",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hokkaido => "北海道地区",
            Self::Tohoku => "東北地区",
            Self::Kanto => "関東地区",
            Self::Chubu => "中部地区",
            Self::Kinki => "近畿地区",
            Self::Chugoku => "中国地区",
            Self::Shikoku => "四国地区",
            Self::Kyushu => "九州・沖縄地区",
        }
    }

    pub fn name_en(&self) -> &'static str {
        match self {
            Self::Hokkaido => "HOKKAIDO AREA",
            Self::Tohoku => "TOHOKU AREA",
            Self::Kanto => "KANTO AREA",
            Self::Chubu => "CHUBU AREA",
            Self::Kinki => "KINKI AREA",
            Self::Chugoku => "CHUGOKU AREA",
            Self::Shikoku => "SHIKOKU AREA",
            Self::Kyushu => "KYUSHU/OKINAWA AREA",
        }
    }

    /// JIS codes of the prefectures in this region, in table order
    pub fn prefecture_codes(&self) -> &'static [&'static str] {
        match self {
            Self::Hokkaido => &["01"],
            Self::Tohoku => &["02", "03", "04", "05", "06", "07"],
            Self::Kanto => &["08", "09", "10", "11", "12", "13", "14"],
            Self::Chubu => &["15", "16", "17", "18", "19", "20", "21", "22", "23"],
            Self::Kinki => &["24", "25", "26", "27", "28", "29", "30"],
            Self::Chugoku => &["31", "32", "33", "34", "35"],
            Self::Shikoku => &["36", "37", "38", "39"],
            Self::Kyushu => &["40", "41", "42", "43", "44", "45", "46", "47"],
        }
    }

    /// Region containing the prefecture with this JIS code
    pub fn of_prefecture(code: &str) -> Option<Region> {
        Self::ALL
            .into_iter()
            .find(|r| r.prefecture_codes().iter().any(|c| *c == code))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Bookstores of one prefecture
#[derive(Debug, Clone, Serialize)]
pub struct PrefectureGroup<'a> {
    pub prefecture: &'static Prefecture,
    pub bookstores: Vec<&'a Bookstore>,
}

/// Bookstores of one region, split by prefecture
#[derive(Debug, Clone, Serialize)]
pub struct RegionGroup<'a> {
    pub region: Region,
    pub prefectures: Vec<PrefectureGroup<'a>>,
}

impl RegionGroup<'_> {
    pub fn bookstore_count(&self) -> usize {
        self.prefectures.iter().map(|p| p.bookstores.len()).sum()
    }
}

/// Group bookstores by region and then prefecture, in table order.
///
/// Prefectures and regions without any bookstore are left out. Bookstores
/// with no prefecture, or a prefecture name not in [`PREFECTURES`], are not
/// part of any group.
pub fn group_by_region<'a, I>(bookstores: I) -> Vec<RegionGroup<'a>>
where
    I: IntoIterator<Item = &'a Bookstore>,
{
    let bookstores: Vec<&'a Bookstore> = bookstores.into_iter().collect();

    Region::ALL
        .into_iter()
        .filter_map(|region| {
            let prefectures: Vec<PrefectureGroup<'a>> = region
                .prefecture_codes()
                .iter()
                .filter_map(|code| prefecture_by_code(code))
                .filter_map(|prefecture| {
                    let members: Vec<&'a Bookstore> = bookstores
                        .iter()
                        .copied()
                        .filter(|s| s.prefecture.as_deref() == Some(prefecture.name))
                        .collect();
                    (!members.is_empty()).then_some(PrefectureGroup {
                        prefecture,
                        bookstores: members,
                    })
                })
                .collect();

            (!prefectures.is_empty()).then_some(RegionGroup {
                region,
                prefectures,
            })
        })
        .collect()
}
