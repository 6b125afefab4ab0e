//! 配置校验模块
//!
//! 校验规则：
//! - shard_count / workers_per_shard / flush_threshold / worktime_secs >= 1
//! - output_dir 非空

use contracts::{ConsumerSettings, ContractError};
use ::validator::Validate;

/// 校验 ConsumerSettings 配置
///
/// 返回第一个遇到的错误 (按字段名排序，保证结果稳定)，或 Ok(())。
pub fn validate(settings: &ConsumerSettings) -> Result<(), ContractError> {
    let Err(errors) = settings.validate() else {
        return Ok(());
    };

    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.keys().collect();
    fields.sort();

    let Some(field) = fields.first() else {
        return Err(ContractError::config_validation("settings", errors.to_string()));
    };

    let message = field_errors
        .get(*field)
        .and_then(|errs| errs.first())
        .map(|e| match &e.message {
            Some(msg) => msg.to_string(),
            None => e.code.to_string(),
        })
        .unwrap_or_else(|| "invalid value".to_string());

    Err(ContractError::config_validation(field.to_string(), message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        let settings = ConsumerSettings::default();
        assert!(validate(&settings).is_ok());
    }

    #[test]
    fn test_zero_shards() {
        let settings = ConsumerSettings {
            shard_count: 0,
            ..Default::default()
        };
        let err = validate(&settings).unwrap_err().to_string();
        assert!(err.contains("shard_count must be >= 1"), "got: {err}");
    }

    #[test]
    fn test_zero_workers() {
        let settings = ConsumerSettings {
            workers_per_shard: 0,
            ..Default::default()
        };
        let err = validate(&settings).unwrap_err().to_string();
        assert!(err.contains("workers_per_shard"), "got: {err}");
    }

    #[test]
    fn test_zero_worktime() {
        let settings = ConsumerSettings {
            worktime_secs: 0,
            ..Default::default()
        };
        let err = validate(&settings).unwrap_err().to_string();
        assert!(err.contains("worktime_secs"), "got: {err}");
    }

    #[test]
    fn test_empty_output_dir() {
        let settings = ConsumerSettings {
            output_dir: PathBuf::new(),
            ..Default::default()
        };
        let err = validate(&settings).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_first_error_is_stable() {
        let settings = ConsumerSettings {
            shard_count: 0,
            flush_threshold: 0,
            ..Default::default()
        };
        let err = validate(&settings).unwrap_err();
        assert!(matches!(
            err,
            ContractError::ConfigValidation { ref field, .. } if field == "flush_threshold"
        ));
    }
}
