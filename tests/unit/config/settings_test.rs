// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置设置测试模块
///
/// 测试配置加载和验证功能
/// 确保默认值与环境变量覆盖均能正确生效
#[cfg(test)]
mod tests {
    use bookrs::config::settings::Settings;
    use std::time::Duration;

    #[test]
    fn test_defaults_and_env_override() {
        let settings = Settings::new().expect("default settings should load");

        assert_eq!(settings.politeness.requests_per_minute, 20);
        assert_eq!(settings.crawler.max_pages_per_category, 0);
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.persistence.batch_failure_policy, "log_and_continue");
        assert_eq!(settings.workers.count, 2);
        assert!(!settings.selectors.product_card.is_empty());
        assert!(!settings.selectors.pagination_controls.is_empty());

        // 所有抓取参数都可以不改代码、只改环境变量调整
        std::env::set_var("BOOKRS__CRAWLER__MAX_PAGES_PER_CATEGORY", "5");
        std::env::set_var("BOOKRS__SITE__USER_AGENT", "bookrs-bot/override");
        let overridden = Settings::new().expect("overridden settings should load");
        std::env::remove_var("BOOKRS__CRAWLER__MAX_PAGES_PER_CATEGORY");
        std::env::remove_var("BOOKRS__SITE__USER_AGENT");

        assert_eq!(overridden.crawler.max_pages_per_category, 5);
        assert_eq!(overridden.site.user_agent, "bookrs-bot/override");
    }

    #[test]
    fn test_retry_settings_convert_to_policy() {
        let settings = Settings::new().expect("default settings should load");
        let policy = settings.retry.policy();

        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_millis(1000));
        assert_eq!(policy.max_backoff, Duration::from_millis(30000));
        assert!(policy.enable_jitter);
    }

    #[test]
    fn test_crawler_timeouts_are_distinct() {
        let settings = Settings::new().expect("default settings should load");

        // 导航抓取的超时短于分页抓取
        assert!(settings.crawler.navigation_timeout() < settings.crawler.category_timeout());
    }
}
