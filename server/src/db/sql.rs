use eventdesk_misc::api::QueryRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(u64),
}

pub struct Select {
    fields: Vec<&'static str>,
    table: &'static str,

    wheres: Vec<String>,

    limit: bool,
    offset: bool,

    order_by: Vec<&'static str>,

    values: Vec<Value>,

    count: bool,
}

impl Select {
    pub fn new(fields: Vec<&'static str>, table: &'static str) -> Self {
        Self {
            fields,
            table,
            wheres: Vec::new(),
            limit: false,
            offset: false,
            order_by: Vec::new(),
            values: Vec::new(),
            count: false,
        }
    }

    pub fn count(table: &'static str) -> Self {
        let mut select = Self::new(vec!["COUNT(1)"], table);
        select.count = true;
        select
    }

    pub fn add_order_by(&mut self, s: &'static str) {
        if self.count {
            return;
        }
        self.order_by.push(s);
    }

    pub fn add_where(&mut self, s: impl ToString, value: Value) {
        self.add_where_values(s, vec![value]);
    }

    /// Adds a condition with one placeholder per value.
    pub fn add_where_values(&mut self, s: impl ToString, values: Vec<Value>) {
        self.wheres.push(s.to_string());
        self.values.extend(values);
    }

    /// Applies search and paging. The search matches any of `search_fields`.
    pub fn set_query(&mut self, query: QueryRequest, search_fields: &[&str]) {
        if let Some(search) = query.search {
            if !search_fields.is_empty() {
                let search = format!("%{search}%");
                let cond = search_fields
                    .iter()
                    .map(|f| format!("{f} LIKE ?"))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                let values = search_fields
                    .iter()
                    .map(|_| Value::Text(search.clone()))
                    .collect();
                self.add_where_values(format!("({cond})"), values);
            }
        }

        if self.count {
            return;
        }

        if let Some(limit) = query.limit {
            self.limit = true;
            self.values.push(Value::Integer(limit));
            if let Some(offset) = query.offset {
                self.offset = true;
                self.values.push(Value::Integer(offset));
            }
        }
    }

    pub fn build(self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT {} FROM {}", self.fields.join(", "), self.table);

        if !self.wheres.is_empty() {
            sql.push_str(&format!(" WHERE {}", self.wheres.join(" AND ")));
        }

        if !self.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order_by.join(", ")));
        }

        if self.limit {
            sql.push_str(" LIMIT ?");
            if self.offset {
                sql.push_str(" OFFSET ?");
            }
        }

        (sql, self.values)
    }
}

pub struct Update {
    table: &'static str,

    fields: Vec<&'static str>,
    wheres: Vec<String>,

    set_values: Vec<Value>,
    where_values: Vec<Value>,
}

impl Update {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            fields: Vec::new(),
            wheres: Vec::new(),
            set_values: Vec::new(),
            where_values: Vec::new(),
        }
    }

    pub fn add_field(&mut self, field: &'static str, value: Value) {
        self.fields.push(field);
        self.set_values.push(value);
    }

    pub fn add_where(&mut self, s: impl ToString, value: Value) {
        self.wheres.push(s.to_string());
        self.where_values.push(value);
    }

    /// Returns an empty statement when no field is set.
    pub fn build(self) -> (String, Vec<Value>) {
        if self.fields.is_empty() {
            return (String::new(), Vec::new());
        }
        let set = self
            .fields
            .iter()
            .map(|f| format!("{f} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("UPDATE {} SET {set}", self.table);

        if !self.wheres.is_empty() {
            sql.push_str(&format!(" WHERE {}", self.wheres.join(" AND ")));
        }

        let mut values = self.set_values;
        values.extend(self.where_values);
        (sql, values)
    }
}
