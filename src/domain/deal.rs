use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discriminator for the closed set of deal configurations.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DealType {
    PercentageDiscount,
    FixedDiscount,
    Bogo,
    Bundle,
    QuantityDiscount,
    Voucher,
}

impl DealType {
    /// Stable string form used as the database discriminator.
    pub fn as_str(self) -> &'static str {
        match self {
            DealType::PercentageDiscount => "percentage_discount",
            DealType::FixedDiscount => "fixed_discount",
            DealType::Bogo => "bogo",
            DealType::Bundle => "bundle",
            DealType::QuantityDiscount => "quantity_discount",
            DealType::Voucher => "voucher",
        }
    }

    /// Parse a submitted deal type string. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "percentage_discount" => Some(DealType::PercentageDiscount),
            "fixed_discount" => Some(DealType::FixedDiscount),
            "bogo" => Some(DealType::Bogo),
            "bundle" => Some(DealType::Bundle),
            "quantity_discount" => Some(DealType::QuantityDiscount),
            "voucher" => Some(DealType::Voucher),
            _ => None,
        }
    }
}

impl std::fmt::Display for DealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated deal configuration. Exactly one variant is ever populated, so a
/// promotion carrying fields of a foreign variant is unrepresentable.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "deal_type", rename_all = "snake_case")]
pub enum DealConfig {
    PercentageDiscount {
        percentage_off: f64,
    },
    FixedDiscount {
        fixed_amount_off: f64,
    },
    Bogo {
        buy_quantity: i32,
        get_quantity: i32,
    },
    Bundle {
        bundle_price: f64,
    },
    QuantityDiscount {
        min_quantity: i32,
        quantity_discount: f64,
    },
    Voucher {
        voucher_value: f64,
    },
}

impl DealConfig {
    /// The discriminator for this configuration.
    pub fn deal_type(&self) -> DealType {
        match self {
            DealConfig::PercentageDiscount { .. } => DealType::PercentageDiscount,
            DealConfig::FixedDiscount { .. } => DealType::FixedDiscount,
            DealConfig::Bogo { .. } => DealType::Bogo,
            DealConfig::Bundle { .. } => DealType::Bundle,
            DealConfig::QuantityDiscount { .. } => DealType::QuantityDiscount,
            DealConfig::Voucher { .. } => DealType::Voucher,
        }
    }

    /// The stated discount percentage, for variants that carry one.
    pub fn discount_percent(&self) -> Option<f64> {
        match self {
            DealConfig::PercentageDiscount { percentage_off } => Some(*percentage_off),
            DealConfig::QuantityDiscount {
                quantity_discount, ..
            } => Some(*quantity_discount),
            _ => None,
        }
    }
}

/// Raw per-variant fields as submitted by the caller, prior to validation.
/// Every field is optional; [`validate`] decides which must be present.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DealFields {
    pub percentage_off: Option<f64>,
    pub fixed_amount_off: Option<f64>,
    pub buy_quantity: Option<i32>,
    pub get_quantity: Option<i32>,
    pub bundle_price: Option<f64>,
    pub min_quantity: Option<i32>,
    pub quantity_discount: Option<f64>,
    pub voucher_value: Option<f64>,
}

impl DealFields {
    fn populated(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.percentage_off.is_some() {
            names.push("percentage_off");
        }
        if self.fixed_amount_off.is_some() {
            names.push("fixed_amount_off");
        }
        if self.buy_quantity.is_some() {
            names.push("buy_quantity");
        }
        if self.get_quantity.is_some() {
            names.push("get_quantity");
        }
        if self.bundle_price.is_some() {
            names.push("bundle_price");
        }
        if self.min_quantity.is_some() {
            names.push("min_quantity");
        }
        if self.quantity_discount.is_some() {
            names.push("quantity_discount");
        }
        if self.voucher_value.is_some() {
            names.push("voucher_value");
        }
        names
    }
}

/// Stable, distinct reasons for rejecting a submitted deal configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DealValidationError {
    #[error("unknown deal type `{0}`")]
    InvalidDealType(String),
    #[error("missing required field `{field}` for {deal_type} deals")]
    MissingField {
        deal_type: DealType,
        field: &'static str,
    },
    #[error("field `{field}` is out of range: {rule}")]
    OutOfRange {
        field: &'static str,
        rule: &'static str,
    },
    #[error("field `{field}` does not belong to {deal_type} deals")]
    UnexpectedField {
        deal_type: DealType,
        field: &'static str,
    },
    #[error("bundle deals require at least two distinct products")]
    BundleTooSmall,
}

fn require_f64(
    deal_type: DealType,
    field: &'static str,
    value: Option<f64>,
) -> Result<f64, DealValidationError> {
    value.ok_or(DealValidationError::MissingField { deal_type, field })
}

fn require_i32(
    deal_type: DealType,
    field: &'static str,
    value: Option<i32>,
) -> Result<i32, DealValidationError> {
    value.ok_or(DealValidationError::MissingField { deal_type, field })
}

fn reject_foreign_fields(
    deal_type: DealType,
    fields: &DealFields,
    allowed: &[&'static str],
) -> Result<(), DealValidationError> {
    match fields
        .populated()
        .into_iter()
        .find(|name| !allowed.contains(name))
    {
        Some(field) => Err(DealValidationError::UnexpectedField { deal_type, field }),
        None => Ok(()),
    }
}

/// Validate a submitted deal configuration against the variant named by
/// `deal_type`, producing the typed [`DealConfig`] on success.
///
/// Total over its inputs: every combination of deal type, fields and product
/// count maps to exactly one outcome. `product_count` is the number of
/// distinct products the promotion would hold; only bundle deals consult it.
pub fn validate(
    deal_type: &str,
    fields: &DealFields,
    product_count: usize,
) -> Result<DealConfig, DealValidationError> {
    let deal_type = DealType::parse(deal_type)
        .ok_or_else(|| DealValidationError::InvalidDealType(deal_type.to_string()))?;

    match deal_type {
        DealType::PercentageDiscount => {
            reject_foreign_fields(deal_type, fields, &["percentage_off"])?;
            let percentage_off = require_f64(deal_type, "percentage_off", fields.percentage_off)?;
            if !(percentage_off > 0.0 && percentage_off <= 100.0) {
                return Err(DealValidationError::OutOfRange {
                    field: "percentage_off",
                    rule: "must be greater than 0 and at most 100",
                });
            }
            Ok(DealConfig::PercentageDiscount { percentage_off })
        }
        DealType::FixedDiscount => {
            reject_foreign_fields(deal_type, fields, &["fixed_amount_off"])?;
            let fixed_amount_off =
                require_f64(deal_type, "fixed_amount_off", fields.fixed_amount_off)?;
            if !(fixed_amount_off > 0.0) {
                return Err(DealValidationError::OutOfRange {
                    field: "fixed_amount_off",
                    rule: "must be greater than 0",
                });
            }
            Ok(DealConfig::FixedDiscount { fixed_amount_off })
        }
        DealType::Bogo => {
            reject_foreign_fields(deal_type, fields, &["buy_quantity", "get_quantity"])?;
            let buy_quantity = require_i32(deal_type, "buy_quantity", fields.buy_quantity)?;
            let get_quantity = require_i32(deal_type, "get_quantity", fields.get_quantity)?;
            if buy_quantity <= 0 {
                return Err(DealValidationError::OutOfRange {
                    field: "buy_quantity",
                    rule: "must be greater than 0",
                });
            }
            if get_quantity <= 0 {
                return Err(DealValidationError::OutOfRange {
                    field: "get_quantity",
                    rule: "must be greater than 0",
                });
            }
            Ok(DealConfig::Bogo {
                buy_quantity,
                get_quantity,
            })
        }
        DealType::Bundle => {
            reject_foreign_fields(deal_type, fields, &["bundle_price"])?;
            let bundle_price = require_f64(deal_type, "bundle_price", fields.bundle_price)?;
            if !(bundle_price > 0.0) {
                return Err(DealValidationError::OutOfRange {
                    field: "bundle_price",
                    rule: "must be greater than 0",
                });
            }
            if product_count < 2 {
                return Err(DealValidationError::BundleTooSmall);
            }
            Ok(DealConfig::Bundle { bundle_price })
        }
        DealType::QuantityDiscount => {
            reject_foreign_fields(deal_type, fields, &["min_quantity", "quantity_discount"])?;
            let min_quantity = require_i32(deal_type, "min_quantity", fields.min_quantity)?;
            let quantity_discount =
                require_f64(deal_type, "quantity_discount", fields.quantity_discount)?;
            if min_quantity <= 1 {
                return Err(DealValidationError::OutOfRange {
                    field: "min_quantity",
                    rule: "must be greater than 1",
                });
            }
            if !(quantity_discount > 0.0 && quantity_discount <= 100.0) {
                return Err(DealValidationError::OutOfRange {
                    field: "quantity_discount",
                    rule: "must be greater than 0 and at most 100",
                });
            }
            Ok(DealConfig::QuantityDiscount {
                min_quantity,
                quantity_discount,
            })
        }
        DealType::Voucher => {
            reject_foreign_fields(deal_type, fields, &["voucher_value"])?;
            let voucher_value = require_f64(deal_type, "voucher_value", fields.voucher_value)?;
            if !(voucher_value > 0.0) {
                return Err(DealValidationError::OutOfRange {
                    field: "voucher_value",
                    rule: "must be greater than 0",
                });
            }
            Ok(DealConfig::Voucher { voucher_value })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> DealFields {
        DealFields::default()
    }

    #[test]
    fn unknown_deal_type_is_rejected() {
        let err = validate("loyalty_points", &fields(), 1).unwrap_err();
        assert_eq!(
            err,
            DealValidationError::InvalidDealType("loyalty_points".to_string())
        );
    }

    #[test]
    fn percentage_discount_boundaries() {
        let mut f = fields();
        f.percentage_off = Some(100.0);
        assert_eq!(
            validate("percentage_discount", &f, 1).unwrap(),
            DealConfig::PercentageDiscount {
                percentage_off: 100.0
            }
        );

        f.percentage_off = Some(0.0001);
        assert!(validate("percentage_discount", &f, 1).is_ok());

        f.percentage_off = Some(0.0);
        assert!(matches!(
            validate("percentage_discount", &f, 1),
            Err(DealValidationError::OutOfRange {
                field: "percentage_off",
                ..
            })
        ));

        f.percentage_off = Some(100.5);
        assert!(matches!(
            validate("percentage_discount", &f, 1),
            Err(DealValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn percentage_discount_requires_its_field() {
        assert_eq!(
            validate("percentage_discount", &fields(), 1).unwrap_err(),
            DealValidationError::MissingField {
                deal_type: DealType::PercentageDiscount,
                field: "percentage_off",
            }
        );
    }

    #[test]
    fn foreign_fields_are_rejected() {
        let mut f = fields();
        f.percentage_off = Some(10.0);
        f.voucher_value = Some(5.0);
        assert_eq!(
            validate("percentage_discount", &f, 1).unwrap_err(),
            DealValidationError::UnexpectedField {
                deal_type: DealType::PercentageDiscount,
                field: "voucher_value",
            }
        );
    }

    #[test]
    fn fixed_discount_boundaries() {
        let mut f = fields();
        f.fixed_amount_off = Some(0.0001);
        assert!(validate("fixed_discount", &f, 1).is_ok());

        f.fixed_amount_off = Some(0.0);
        assert!(matches!(
            validate("fixed_discount", &f, 1),
            Err(DealValidationError::OutOfRange {
                field: "fixed_amount_off",
                ..
            })
        ));

        f.fixed_amount_off = Some(-1.0);
        assert!(validate("fixed_discount", &f, 1).is_err());
    }

    #[test]
    fn bogo_requires_positive_quantities() {
        let mut f = fields();
        f.buy_quantity = Some(1);
        f.get_quantity = Some(1);
        assert!(validate("bogo", &f, 1).is_ok());

        f.get_quantity = Some(0);
        assert!(matches!(
            validate("bogo", &f, 1),
            Err(DealValidationError::OutOfRange {
                field: "get_quantity",
                ..
            })
        ));

        f.get_quantity = None;
        assert_eq!(
            validate("bogo", &f, 1).unwrap_err(),
            DealValidationError::MissingField {
                deal_type: DealType::Bogo,
                field: "get_quantity",
            }
        );
    }

    #[test]
    fn bundle_requires_two_products() {
        let mut f = fields();
        f.bundle_price = Some(25.0);
        assert!(validate("bundle", &f, 2).is_ok());
        assert_eq!(
            validate("bundle", &f, 1).unwrap_err(),
            DealValidationError::BundleTooSmall
        );

        f.bundle_price = Some(0.0);
        assert!(matches!(
            validate("bundle", &f, 2),
            Err(DealValidationError::OutOfRange {
                field: "bundle_price",
                ..
            })
        ));
    }

    #[test]
    fn quantity_discount_boundaries() {
        let mut f = fields();
        f.min_quantity = Some(2);
        f.quantity_discount = Some(100.0);
        assert!(validate("quantity_discount", &f, 1).is_ok());

        f.min_quantity = Some(1);
        assert!(matches!(
            validate("quantity_discount", &f, 1),
            Err(DealValidationError::OutOfRange {
                field: "min_quantity",
                ..
            })
        ));

        f.min_quantity = Some(2);
        f.quantity_discount = Some(100.1);
        assert!(matches!(
            validate("quantity_discount", &f, 1),
            Err(DealValidationError::OutOfRange {
                field: "quantity_discount",
                ..
            })
        ));
    }

    #[test]
    fn voucher_boundaries() {
        let mut f = fields();
        f.voucher_value = Some(0.0001);
        assert!(validate("voucher", &f, 1).is_ok());

        f.voucher_value = Some(0.0);
        assert!(matches!(
            validate("voucher", &f, 1),
            Err(DealValidationError::OutOfRange {
                field: "voucher_value",
                ..
            })
        ));
    }

    #[test]
    fn nan_values_fail_range_checks_instead_of_panicking() {
        let mut f = fields();
        f.percentage_off = Some(f64::NAN);
        assert!(matches!(
            validate("percentage_discount", &f, 1),
            Err(DealValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn deal_type_parse_is_case_insensitive() {
        assert_eq!(
            DealType::parse("PERCENTAGE_DISCOUNT"),
            Some(DealType::PercentageDiscount)
        );
        assert_eq!(DealType::parse(" voucher "), Some(DealType::Voucher));
        assert_eq!(DealType::parse("unknown"), None);
    }
}
