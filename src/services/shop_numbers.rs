use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::ShopData;

/// Numeric part and optional suffix of a shop number such as "10-B".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopNumber {
    pub number: u64,
    pub suffix: String,
}

/// Parse `<digits>` or `<digits>-<word>`. Anything else is `{0, ""}`.
pub fn parse_shop_number(raw: &str) -> ShopNumber {
    let invalid = ShopNumber {
        number: 0,
        suffix: String::new(),
    };

    let (digits, suffix) = match raw.split_once('-') {
        Some((digits, suffix)) => (digits, suffix),
        None => (raw, ""),
    };
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return invalid;
    }
    if raw.contains('-')
        && (suffix.is_empty()
            || !suffix
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_'))
    {
        return invalid;
    }

    ShopNumber {
        number: digits.parse().unwrap_or(0),
        suffix: suffix.to_string(),
    }
}

/// Numeric order first, suffix second ("1" < "1-A" < "2" < "10").
pub fn compare_shop_numbers(left: &str, right: &str) -> Ordering {
    let left = parse_shop_number(left);
    let right = parse_shop_number(right);
    left.number
        .cmp(&right.number)
        .then_with(|| left.suffix.cmp(&right.suffix))
}

/// Shops with an Active tenant, in shop-number order. Shops without a tenant are dropped.
pub fn get_active_shops(shops: &BTreeMap<String, ShopData>) -> Vec<(&str, &ShopData)> {
    let mut active = shops
        .iter()
        .filter(|(_, shop)| shop.is_active())
        .map(|(number, shop)| (number.as_str(), shop))
        .collect::<Vec<_>>();
    active.sort_by(|(left, _), (right, _)| compare_shop_numbers(left, right));
    active
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{get_active_shops, parse_shop_number, ShopNumber};
    use crate::models::{ShopData, Tenant, TenantStatus};

    fn shop(status: Option<TenantStatus>) -> ShopData {
        ShopData {
            tenant: status.map(|status| Tenant {
                status,
                ..Tenant::default()
            }),
            ..ShopData::default()
        }
    }

    fn parsed(number: u64, suffix: &str) -> ShopNumber {
        ShopNumber {
            number,
            suffix: suffix.to_string(),
        }
    }

    #[test]
    fn parses_simple_and_suffixed_numbers() {
        assert_eq!(parse_shop_number("1"), parsed(1, ""));
        assert_eq!(parse_shop_number("123"), parsed(123, ""));
        assert_eq!(parse_shop_number("1-A"), parsed(1, "A"));
        assert_eq!(parse_shop_number("10-B"), parsed(10, "B"));
    }

    #[test]
    fn invalid_formats_parse_to_zero() {
        assert_eq!(parse_shop_number("invalid"), parsed(0, ""));
        assert_eq!(parse_shop_number("10-"), parsed(0, ""));
        assert_eq!(parse_shop_number("-A"), parsed(0, ""));
        assert_eq!(parse_shop_number("1-A-B"), parsed(0, ""));
    }

    #[test]
    fn empty_input_yields_no_shops() {
        assert!(get_active_shops(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn filters_inactive_and_tenantless_shops() {
        let shops = BTreeMap::from([
            ("1".to_string(), shop(Some(TenantStatus::Active))),
            ("2".to_string(), shop(Some(TenantStatus::Inactive))),
            ("3".to_string(), shop(Some(TenantStatus::Active))),
            ("4".to_string(), shop(None)),
        ]);
        let numbers = get_active_shops(&shops)
            .into_iter()
            .map(|(number, _)| number)
            .collect::<Vec<_>>();
        assert_eq!(numbers, vec!["1", "3"]);
    }

    #[test]
    fn sorts_numerically_then_by_suffix() {
        let shops = ["10", "1", "2", "1-B", "1-A"]
            .into_iter()
            .map(|number| (number.to_string(), shop(Some(TenantStatus::Active))))
            .collect::<BTreeMap<_, _>>();
        let numbers = get_active_shops(&shops)
            .into_iter()
            .map(|(number, _)| number)
            .collect::<Vec<_>>();
        assert_eq!(numbers, vec!["1", "1-A", "1-B", "2", "10"]);
    }
}
