//! 路由定义模块 - 领域模型
//!
//! 纯粹的业务逻辑层，不依赖于 DOM。

use std::fmt::Display;

const DASHBOARD_PREFIX: &str = "/dashboard/";

/// 应用路由枚举
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AppRoute {
    /// 落地页
    #[default]
    Home,
    Login,
    /// 控制面板首页 (需要认证)
    Dashboard,
    /// 资料补全页 (需要认证)
    Profile,
    Reminders,
    /// 其余 `/dashboard/<name>` 子页面
    Section(String),
    /// 页面未找到
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举，忽略查询串与末尾斜杠
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Self::Home,
            "/login" => Self::Login,
            "/dashboard" => Self::Dashboard,
            "/dashboard/profile" => Self::Profile,
            "/dashboard/reminders" => Self::Reminders,
            other => match other.strip_prefix(DASHBOARD_PREFIX) {
                Some(name) if is_section_name(name) => Self::Section(name.to_string()),
                _ => Self::NotFound,
            },
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Login => "/login".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Profile => "/dashboard/profile".to_string(),
            Self::Reminders => "/dashboard/reminders".to_string(),
            Self::Section(name) => format!("{DASHBOARD_PREFIX}{name}"),
            Self::NotFound => "/404".to_string(),
        }
    }

    /// 该路由是否需要认证
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Self::Dashboard | Self::Profile | Self::Reminders | Self::Section(_)
        )
    }
}

fn is_section_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Home);
        assert_eq!(AppRoute::from_path("/login?next=x"), AppRoute::Login);
        assert_eq!(AppRoute::from_path("/dashboard/"), AppRoute::Dashboard);
        assert_eq!(AppRoute::from_path("/dashboard/profile"), AppRoute::Profile);
        assert_eq!(AppRoute::from_path("/dashboard/reminders"), AppRoute::Reminders);
        assert_eq!(
            AppRoute::from_path("/dashboard/prescriptions"),
            AppRoute::Section("prescriptions".into())
        );
        assert_eq!(AppRoute::from_path("/dashboard/a/b"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/elsewhere"), AppRoute::NotFound);
    }

    #[test]
    fn test_paths_round_trip_for_known_routes() {
        for route in [
            AppRoute::Home,
            AppRoute::Login,
            AppRoute::Dashboard,
            AppRoute::Profile,
            AppRoute::Reminders,
            AppRoute::Section("news".into()),
        ] {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
    }

    #[test]
    fn test_requires_auth() {
        assert!(!AppRoute::Home.requires_auth());
        assert!(!AppRoute::Login.requires_auth());
        assert!(AppRoute::Section("x".into()).requires_auth());
        assert!(AppRoute::Profile.requires_auth());
    }
}
