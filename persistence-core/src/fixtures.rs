//! Entities shared by the unit tests

use once_cell::sync::Lazy;

use crate::entity::{Entity, IdAssignment};
use crate::memory::InMemoryStore;
use crate::metadata::{CollectionType, Managed, ManagedType, Value, ValueType};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
}

impl Address {
    pub fn in_city(city: &str) -> Self {
        Self {
            city: Some(city.to_string()),
            ..Self::default()
        }
    }
}

static ADDRESS: Lazy<ManagedType<Address>> = Lazy::new(|| {
    ManagedType::<Address>::builder("Address")
        .basic("street", ValueType::Text, |a: &Address| a.street.clone())
        .basic("city", ValueType::Text, |a: &Address| a.city.clone())
        .basic("zip", ValueType::Text, |a: &Address| a.zip.clone())
        .build()
});

impl Managed for Address {
    fn managed_type() -> &'static ManagedType<Self> {
        &ADDRESS
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customer {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub active: Option<bool>,
    pub visits: Option<u64>,
    /// Identifier of the owning account
    pub account: Option<i64>,
    pub address: Option<Address>,
    pub tags: Option<Vec<String>>,
    pub badges: Option<Vec<String>>,
}

impl Customer {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = Some(tags.iter().map(ToString::to_string).collect());
        self
    }
}

static CUSTOMER: Lazy<ManagedType<Customer>> = Lazy::new(|| {
    ManagedType::<Customer>::builder("Customer")
        .basic("id", ValueType::Integer, |c: &Customer| c.id)
        .basic("name", ValueType::Text, |c: &Customer| c.name.clone())
        .basic("email", ValueType::Text, |c: &Customer| c.email.clone())
        .basic("age", ValueType::Integer, |c: &Customer| c.age)
        .basic("active", ValueType::Boolean, |c: &Customer| c.active)
        .try_basic("visits", ValueType::Integer, |c: &Customer| {
            c.visits.map_or(Ok(Value::Null), Value::try_from)
        })
        .many_to_one("account", ValueType::Integer, |c: &Customer| c.account)
        .embedded("address", |c: &Customer| c.address.as_ref())
        .list("tags", ValueType::Text, |c: &Customer| c.tags.clone())
        .collection("badges", CollectionType::Set, ValueType::Text, |c: &Customer| {
            c.badges.clone()
        })
        .build()
});

impl Managed for Customer {
    fn managed_type() -> &'static ManagedType<Self> {
        &CUSTOMER
    }
}

impl Entity for Customer {
    type Id = i64;

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

/// Entity whose identifier is assigned by callers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Country {
    pub code: Option<String>,
    pub name: Option<String>,
}

impl Country {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            name: Some(name.to_string()),
        }
    }
}

static COUNTRY: Lazy<ManagedType<Country>> = Lazy::new(|| {
    ManagedType::<Country>::builder("Country")
        .basic("code", ValueType::Text, |c: &Country| c.code.clone())
        .basic("name", ValueType::Text, |c: &Country| c.name.clone())
        .build()
});

impl Managed for Country {
    fn managed_type() -> &'static ManagedType<Self> {
        &COUNTRY
    }
}

impl Entity for Country {
    type Id = String;
    const ID_ASSIGNMENT: IdAssignment = IdAssignment::Manual;

    fn id(&self) -> Option<&String> {
        self.code.as_ref()
    }

    fn set_id(&mut self, id: String) {
        self.code = Some(id);
    }
}

/// Alice (1), Albert (2) and Bob (3), in that order
pub async fn customer_store() -> InMemoryStore<Customer> {
    let store = InMemoryStore::new().with_id_generator(|seq| seq as i64);
    let customers = [
        Customer {
            email: Some("alice@example.com".to_string()),
            age: Some(30),
            active: Some(true),
            account: Some(7),
            ..Customer::named("Alice")
        }
        .with_address(Address::in_city("Paris"))
        .with_tags(&["vip"]),
        Customer {
            email: Some("albert@example.com".to_string()),
            age: Some(25),
            active: Some(false),
            account: Some(3),
            ..Customer::named("Albert")
        }
        .with_address(Address::in_city("Lyon"))
        .with_tags(&["new"]),
        Customer {
            email: Some("bob@example.com".to_string()),
            age: Some(45),
            active: Some(true),
            account: Some(7),
            ..Customer::named("Bob")
        }
        .with_tags(&["vip", "new"]),
    ];
    for customer in customers {
        store
            .insert(customer)
            .await
            .expect("seed customers have no identifier");
    }
    store
}

pub fn country_store() -> InMemoryStore<Country> {
    InMemoryStore::new()
}
