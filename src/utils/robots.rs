// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::utils::retry_policy::RetryPolicy;

/// 规则缓存的有效期
const CACHE_TTL: Duration = Duration::from_secs(3600);

/// robots.txt 抓取超时
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// 解析后的 robots.txt 规则
///
/// 仅保留适用于通配符块和本爬虫命名块的 Allow/Disallow 模式。
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    /// Allow 模式列表
    allow: Vec<String>,
    /// Disallow 模式列表
    disallow: Vec<String>,
}

impl RobotsRules {
    /// 解析 robots.txt 内容
    ///
    /// 收集 `User-agent: *` 块以及名称与本爬虫 UA 匹配的块中的规则，
    /// 其余块一律忽略。
    ///
    /// # 参数
    ///
    /// * `content` - robots.txt 原始内容
    /// * `user_agent` - 本爬虫的 User-Agent 字符串
    ///
    /// # 返回值
    ///
    /// 返回解析出的规则集合
    pub fn parse(content: &str, user_agent: &str) -> Self {
        let ua_lower = user_agent.to_lowercase();
        let mut rules = RobotsRules::default();
        let mut block_applies = false;
        let mut in_agent_header = false;

        for line in content.lines() {
            // 去掉行内注释
            let line = match line.split_once('#') {
                Some((before, _)) => before.trim(),
                None => line.trim(),
            };
            if line.is_empty() {
                continue;
            }

            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let field = field.trim().to_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    // 连续的 User-agent 行属于同一个块
                    if !in_agent_header {
                        block_applies = false;
                        in_agent_header = true;
                    }
                    if value == "*" || ua_lower.contains(&value.to_lowercase()) {
                        block_applies = true;
                    }
                }
                "allow" => {
                    in_agent_header = false;
                    if block_applies && !value.is_empty() {
                        rules.allow.push(value.to_string());
                    }
                }
                "disallow" => {
                    in_agent_header = false;
                    if block_applies && !value.is_empty() {
                        rules.disallow.push(value.to_string());
                    }
                }
                _ => {
                    in_agent_header = false;
                }
            }
        }

        rules
    }

    /// 判断路径是否允许抓取
    ///
    /// 路径命中任意 Disallow 模式即视为禁止，除非存在字面前缀
    /// 相同或更长的 Allow 模式同时命中。
    pub fn is_allowed(&self, path: &str) -> bool {
        let best_disallow = self
            .disallow
            .iter()
            .filter_map(|p| Self::match_len(p, path))
            .max();

        let Some(disallow_len) = best_disallow else {
            return true;
        };

        let best_allow = self
            .allow
            .iter()
            .filter_map(|p| Self::match_len(p, path))
            .max();

        matches!(best_allow, Some(allow_len) if allow_len >= disallow_len)
    }

    /// 计算模式对路径的字面前缀匹配长度
    ///
    /// `"/"` 匹配一切；尾部 `*` 表示去掉通配符后的前缀匹配；
    /// 其余模式均为字面路径前缀匹配。不匹配时返回 None。
    fn match_len(pattern: &str, path: &str) -> Option<usize> {
        let stem = pattern.strip_suffix('*').unwrap_or(pattern);
        if path.starts_with(stem) {
            Some(stem.len())
        } else {
            None
        }
    }
}

/// 缓存的规则条目
#[derive(Clone)]
struct CachedRules {
    /// 规则
    rules: RobotsRules,
    /// 过期时间
    expires_at: Instant,
}

/// Robots.txt检查器
///
/// 按站点源缓存规则，过期后重新抓取解析。抓取或解析失败时
/// 一律放行（fail-open），绝不向调用方抛出错误。
pub struct RobotsChecker {
    /// HTTP客户端
    client: Client,

    /// 内存缓存，键为站点源
    cache: Mutex<HashMap<String, CachedRules>>,

    /// 重试策略
    retry_policy: RetryPolicy,

    /// 本爬虫的 User-Agent
    user_agent: String,
}

impl RobotsChecker {
    /// 创建新的Robots检查器实例
    ///
    /// # 参数
    ///
    /// * `user_agent` - 本爬虫的 User-Agent 字符串
    ///
    /// # 返回值
    ///
    /// 返回新的Robots检查器实例
    pub fn new(user_agent: String) -> Self {
        Self {
            client: Client::new(),
            cache: Mutex::new(HashMap::new()),
            retry_policy: RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::from_secs(2),
                max_backoff: Duration::from_secs(10),
                ..Default::default()
            },
            user_agent,
        }
    }

    /// 检查URL是否被允许访问
    ///
    /// 规则获取失败时默认放行。
    ///
    /// # 参数
    ///
    /// * `url_str` - 待检查的URL
    ///
    /// # 返回值
    ///
    /// 允许访问返回 true，被 robots 规则禁止返回 false
    pub async fn allowed(&self, url_str: &str) -> bool {
        let Ok(url) = Url::parse(url_str) else {
            warn!("Robots check skipped, invalid URL: {}", url_str);
            return true;
        };

        match self.get_rules(&url).await {
            Ok(rules) => rules.is_allowed(url.path()),
            Err(e) => {
                warn!("Robots rules unavailable for {}, allowing: {}", url_str, e);
                true
            }
        }
    }

    /// 获取站点源的规则（带缓存）
    async fn get_rules(&self, url: &Url) -> Result<RobotsRules> {
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("URL has no host"))?;
        let scheme = url.scheme();
        let port = url.port_or_known_default().unwrap_or(80);

        let origin = format!("{}://{}:{}", scheme, host, port);

        // 1. Check memory cache
        {
            let mut cache = self.cache.lock().unwrap();
            if let Some(cached) = cache.get(&origin) {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.rules.clone());
                } else {
                    cache.remove(&origin);
                }
            }
        }

        // 2. Fetch and parse robots.txt
        let robots_url = format!("{}/robots.txt", origin);
        let content = self.fetch_robots(&robots_url).await;
        let rules = RobotsRules::parse(&content, &self.user_agent);
        debug!(
            "Parsed robots.txt for {}: {} allow / {} disallow rules",
            origin,
            rules.allow.len(),
            rules.disallow.len()
        );

        // 3. Update memory cache
        {
            let mut cache = self.cache.lock().unwrap();
            cache.insert(
                origin,
                CachedRules {
                    rules: rules.clone(),
                    expires_at: Instant::now() + CACHE_TTL,
                },
            );
        }

        Ok(rules)
    }

    /// 抓取 robots.txt 内容（带重试）
    ///
    /// 404 视为没有规则；持续失败时返回空内容（放行）。
    async fn fetch_robots(&self, robots_url: &str) -> String {
        let mut attempt = 0;
        let mut content = String::new();
        let mut last_error = None;

        while attempt < self.retry_policy.max_attempts {
            attempt += 1;
            let response = self
                .client
                .get(robots_url)
                .header("User-Agent", self.user_agent.as_str())
                .timeout(FETCH_TIMEOUT)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    if resp.status().is_success() {
                        content = resp.text().await.unwrap_or_default();
                        last_error = None;
                        break;
                    } else if resp.status() == reqwest::StatusCode::NOT_FOUND {
                        // 404 is a valid response, meaning no robots.txt
                        content = String::new();
                        last_error = None;
                        break;
                    } else if resp.status().is_server_error() {
                        last_error = Some(anyhow::anyhow!("Server error: {}", resp.status()));
                    } else {
                        // Other client errors are treated as "no rules"
                        content = String::new();
                        last_error = None;
                        break;
                    }
                }
                Err(e) => {
                    last_error = Some(anyhow::anyhow!("Request failed: {}", e));
                }
            }

            if attempt < self.retry_policy.max_attempts {
                let backoff = self.retry_policy.calculate_backoff(attempt);
                tokio::time::sleep(backoff).await;
            }
        }

        if let Some(err) = last_error {
            warn!("Failed to fetch robots.txt from {}: {}", robots_url, err);
            // Fail open: no rules on persistent error
            content = String::new();
        }

        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const UA: &str = "bookrs-bot/1.0";

    #[test]
    fn test_disallow_with_more_specific_allow() {
        let content = "User-agent: *\nDisallow: /admin\nAllow: /admin/public\n";
        let rules = RobotsRules::parse(content, UA);

        assert!(!rules.is_allowed("/admin/x"));
        assert!(rules.is_allowed("/admin/public/x"));
        assert!(rules.is_allowed("/other"));
    }

    #[test]
    fn test_root_pattern_matches_everything() {
        let rules = RobotsRules::parse("User-agent: *\nDisallow: /\n", UA);

        assert!(!rules.is_allowed("/"));
        assert!(!rules.is_allowed("/anything/at/all"));
    }

    #[test]
    fn test_trailing_wildcard_is_prefix_match() {
        let rules = RobotsRules::parse("User-agent: *\nDisallow: /cart*\n", UA);

        assert!(!rules.is_allowed("/cart"));
        assert!(!rules.is_allowed("/cart/checkout"));
        assert!(rules.is_allowed("/car"));
    }

    #[test]
    fn test_bot_named_block_applies() {
        let content = "User-agent: googlebot\nDisallow: /private\n\nUser-agent: bookrs-bot\nDisallow: /staging\n";
        let rules = RobotsRules::parse(content, UA);

        // googlebot 块不适用于本爬虫
        assert!(rules.is_allowed("/private/x"));
        assert!(!rules.is_allowed("/staging/x"));
    }

    #[test]
    fn test_empty_disallow_allows_all() {
        let rules = RobotsRules::parse("User-agent: *\nDisallow:\n", UA);

        assert!(rules.is_allowed("/anything"));
    }

    #[tokio::test]
    async fn test_allowed_consults_fetched_rules() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin\n"),
            )
            .expect(1) // 第二次检查应命中缓存
            .mount(&server)
            .await;

        let checker = RobotsChecker::new(UA.to_string());

        assert!(!checker.allowed(&format!("{}/admin/x", server.uri())).await);
        assert!(checker.allowed(&format!("{}/books", server.uri())).await);
    }

    #[tokio::test]
    async fn test_fetch_failure_fails_open() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let checker = RobotsChecker::new(UA.to_string());

        assert!(checker.allowed(&format!("{}/anything", server.uri())).await);
    }
}
