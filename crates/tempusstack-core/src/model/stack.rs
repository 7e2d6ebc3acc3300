//! スタック定義

use super::service::ServiceSpec;

/// 宣言順を保持するサービスの集合
///
/// 宣言順がそのまま起動順になる。サービス名は一意。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackSpec {
    services: Vec<ServiceSpec>,
}

impl StackSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// サービスを追加する
    ///
    /// 同名のサービスが既にあれば位置を保ったまま置き換え、古い定義を返す。
    pub fn insert(&mut self, service: ServiceSpec) -> Option<ServiceSpec> {
        match self.services.iter_mut().find(|s| s.name == service.name) {
            Some(existing) => Some(std::mem::replace(existing, service)),
            None => {
                self.services.push(service);
                None
            }
        }
    }

    pub fn with_service(mut self, service: ServiceSpec) -> Self {
        self.insert(service);
        self
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.services.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|s| s.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
