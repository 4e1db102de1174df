//! Fixtures shared by the tests of this crate.

use common::{Date, DateTime, FixedClock};

use crate::{
    domain::{customer, vehicle, Customer, Vehicle},
    infra::Memory,
    task, Config, Service,
};

/// Parses the provided `YYYY-MM-DD` string into a [`Date`].
pub(crate) fn date(s: &str) -> Date {
    s.parse().unwrap()
}

/// Creates a new [`vehicle::Status::Available`] [`Vehicle`] renting for the
/// provided daily price.
pub(crate) fn vehicle(daily_price: &str) -> Vehicle {
    let now = DateTime::now();
    Vehicle {
        id: vehicle::Id::new(),
        plate: vehicle::Plate::new("ABC-123").unwrap(),
        brand: vehicle::Brand::new("Toyota").unwrap(),
        model: vehicle::Model::new("Corolla").unwrap(),
        year: 2020,
        fuel: Some(vehicle::Fuel::Gasoline),
        status: vehicle::Status::Available,
        daily_price: Some(daily_price.parse().unwrap()),
        created_at: now.coerce(),
        updated_at: now.coerce(),
    }
}

/// Creates a new [`Customer`].
pub(crate) fn customer() -> Customer {
    Customer {
        id: customer::Id::new(),
        first_names: customer::Name::new("Ana Maria").unwrap(),
        last_names: customer::Name::new("Rojas Vega").unwrap(),
        document_kind: customer::DocumentKind::CitizenId,
        document_number: customer::DocumentNumber::new("1020304050")
            .unwrap(),
        email: customer::Email::new("ana@example.com").unwrap(),
        phone: customer::Phone::new("+57 300 123 4567").unwrap(),
        created_at: DateTime::now().coerce(),
    }
}

/// Creates a new [`Service`] over the provided [`Memory`] database, living
/// on the provided `today` date and running no background tasks.
pub(crate) fn service(
    database: Memory,
    today: &str,
) -> Service<Memory, FixedClock> {
    Service {
        config: Config {
            reconcile_rentals: task::reconcile_rentals::Config {
                enabled: false,
                ..task::reconcile_rentals::Config::default()
            },
        },
        database,
        clock: FixedClock(date(today)),
    }
}

/// Seeds the provided [`Memory`] database with a fresh [`Vehicle`] and
/// [`Customer`].
pub(crate) async fn seed(
    database: &Memory,
    daily_price: &str,
) -> (Vehicle, Customer) {
    let (vehicle, customer) = (vehicle(daily_price), customer());
    database.add_vehicle(vehicle.clone()).await;
    database.add_customer(customer.clone()).await;
    (vehicle, customer)
}
