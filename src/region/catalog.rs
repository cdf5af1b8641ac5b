//! # 地区目录
//!
//! 保持声明顺序，输出中的地区组顺序即目录顺序。

/// 地区
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// 地区名（如 `香港`）
    pub name: String,
    /// 显示图标（如 `🇭🇰`）
    pub glyph: String,
    /// 节点名匹配关键词，顺序保留
    pub keywords: Vec<String>,
}

impl Region {
    /// 解析 `glyph,kw1,kw2,...` 形式的配置值
    ///
    /// 第一个字段是图标，其余为关键词；空关键词被丢弃。
    pub fn parse(name: &str, value: &str) -> Self {
        let mut parts = value.split(',').map(str::trim);
        let glyph = parts.next().unwrap_or_default().to_string();
        let keywords = parts.filter(|k| !k.is_empty()).map(String::from).collect();

        Self {
            name: name.trim().to_string(),
            glyph,
            keywords,
        }
    }

    /// 组名前缀 `{glyph}{name}`
    pub fn label(&self) -> String {
        format!("{}{}", self.glyph, self.name)
    }
}

/// 地区目录，名称唯一（大小写不敏感）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    /// 构建目录；重名时后声明者覆盖先声明者，但保留首次出现的位置
    pub fn new(regions: impl IntoIterator<Item = Region>) -> Self {
        let mut catalog = Self::default();
        for region in regions {
            match catalog.position(&region.name) {
                Some(idx) => catalog.regions[idx] = region,
                None => catalog.regions.push(region),
            }
        }
        catalog
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.regions
            .iter()
            .position(|r| r.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.position(name).map(|idx| &self.regions[idx])
    }

    /// 按地区名查关键词
    pub fn keywords(&self, name: &str) -> Option<&[String]> {
        self.get(name).map(|r| r.keywords.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
