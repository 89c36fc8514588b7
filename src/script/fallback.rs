//! Built-in character substitution table.
//!
//! A last resort covering the most frequent Simplified characters. No
//! character appears on both sides of the table, so applying it twice gives
//! the same result as applying it once.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Simplified → Traditional pairs.
pub const FALLBACK_TABLE: &[(char, char)] = &[
    ('这', '這'),
    ('个', '個'),
    ('说', '說'),
    ('时', '時'),
    ('会', '會'),
    ('来', '來'),
    ('对', '對'),
    ('们', '們'),
    ('国', '國'),
    ('经', '經'),
    ('过', '過'),
    ('现', '現'),
    ('发', '發'),
    ('应', '應'),
    ('样', '樣'),
    ('还', '還'),
    ('没', '沒'),
    ('问', '問'),
    ('题', '題'),
    ('间', '間'),
    ('关', '關'),
    ('系', '係'),
    ('实', '實'),
    ('际', '際'),
    ('认', '認'),
    ('为', '為'),
    ('学', '學'),
    ('习', '習'),
    ('电', '電'),
    ('脑', '腦'),
    ('网', '網'),
    ('络', '絡'),
    ('计', '計'),
    ('机', '機'),
    ('数', '數'),
    ('据', '據'),
    ('库', '庫'),
    ('软', '軟'),
    ('开', '開'),
    ('设', '設'),
    ('语', '語'),
    ('术', '術'),
    ('书', '書'),
    ('读', '讀'),
    ('写', '寫'),
    ('东', '東'),
    ('车', '車'),
    ('长', '長'),
    ('门', '門'),
    ('见', '見'),
    ('页', '頁'),
    ('节', '節'),
];

static TABLE: LazyLock<HashMap<char, char>> =
    LazyLock::new(|| FALLBACK_TABLE.iter().copied().collect());

/// Replace every mapped Simplified character with its Traditional form.
pub fn fallback_convert(text: &str) -> String {
    text.chars()
        .map(|c| TABLE.get(&c).copied().unwrap_or(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_basic_conversion() {
        assert_eq!(fallback_convert("这是一个问题"), "這是一個問題");
        assert_eq!(fallback_convert("plain ascii"), "plain ascii");
    }

    #[test]
    fn test_table_sides_are_disjoint() {
        let simplified: HashSet<char> = FALLBACK_TABLE.iter().map(|&(s, _)| s).collect();
        assert_eq!(simplified.len(), FALLBACK_TABLE.len(), "duplicate keys");
        for &(s, t) in FALLBACK_TABLE {
            assert_ne!(s, t);
            assert!(!simplified.contains(&t), "{t} appears on both sides");
        }
    }

    proptest! {
        #[test]
        fn prop_conversion_is_idempotent(text in "[这个说时会来电脑abc 书读写 ]{0,40}") {
            let once = fallback_convert(&text);
            prop_assert_eq!(fallback_convert(&once), once.clone());
            prop_assert_eq!(once.chars().count(), text.chars().count());
        }
    }
}
