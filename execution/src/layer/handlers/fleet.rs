//! Account and aircraft workflows: open, purchase, sell.

use skyport_types::{
    api::{OpenReceipt, PurchaseReceipt, SaleReceipt},
    engine::{Event, Key, Value},
    error::EngineError,
    game::{
        Account, Aircraft, AircraftStatus, LedgerCategory, BPS, FLEET_LIMIT, RESALE_RATE_BPS,
        STARTING_BALANCE,
    },
    AccountId, AircraftId, AircraftTypeId,
};

use crate::layer::Layer;
use crate::state::State;

impl<'a, S: State> Layer<'a, S> {
    /// Open an account, crediting the starting balance through the ledger so
    /// even the grant is reconcilable.
    pub(crate) async fn handle_open_account(
        &mut self,
        account: AccountId,
        name: &str,
    ) -> Result<OpenReceipt, EngineError> {
        if self.get(&Key::Account(account)).await.is_some() {
            return Err(EngineError::AccountExists);
        }

        let mut record = Account::open(name.to_string(), self.now());
        self.record_entry(
            account,
            &mut record,
            STARTING_BALANCE as i64,
            LedgerCategory::InitialGrant,
            "initial balance".to_string(),
            None,
            None,
        )
        .await;
        let balance = record.balance;
        self.insert(Key::Account(account), Value::Account(record))
            .await;

        self.emit(Event::AccountOpened {
            account,
            starting_balance: balance,
        });
        Ok(OpenReceipt { account, balance })
    }

    /// Buy one catalog aircraft. Checked in order: account, fleet limit,
    /// catalog entry, funds.
    pub(crate) async fn handle_purchase_aircraft(
        &mut self,
        account: AccountId,
        aircraft_type: AircraftTypeId,
    ) -> Result<PurchaseReceipt, EngineError> {
        let mut record = self.active_account(account).await?;

        let mut fleet = self.ids(&Key::Fleet(account)).await;
        if fleet.len() >= FLEET_LIMIT {
            return Err(EngineError::FleetLimitReached);
        }

        let catalog = match self.get(&Key::AircraftType(aircraft_type)).await {
            Some(Value::AircraftType(catalog)) if catalog.is_active => catalog,
            _ => return Err(EngineError::AircraftTypeNotFound),
        };
        if record.balance < catalog.base_price {
            return Err(EngineError::InsufficientFunds {
                have: record.balance,
                need: catalog.base_price,
            });
        }

        let id = self.next_id(Key::AircraftSeq).await;
        let aircraft = Aircraft {
            id,
            owner: account,
            aircraft_type,
            role: catalog.role,
            status: AircraftStatus::Idle,
            purchased_price: catalog.base_price,
            purchased_at: self.now(),
            nickname: None,
        };

        self.record_entry(
            account,
            &mut record,
            -(catalog.base_price as i64),
            LedgerCategory::AircraftPurchase,
            format!("aircraft purchase: {}", catalog.model),
            Some(id),
            None,
        )
        .await;
        let new_balance = record.balance;

        fleet.push(id);
        self.insert(Key::Aircraft(id), Value::Aircraft(aircraft.clone()))
            .await;
        self.insert(Key::Fleet(account), Value::Ids(fleet)).await;
        self.insert(Key::Account(account), Value::Account(record))
            .await;

        self.emit(Event::AircraftPurchased {
            account,
            aircraft: id,
            aircraft_type,
            price: catalog.base_price,
            new_balance,
        });
        Ok(PurchaseReceipt {
            aircraft,
            new_balance,
        })
    }

    /// Sell an owned aircraft at the resale rate of its purchase price. A
    /// committed unit cannot be sold out from under its running mission.
    pub(crate) async fn handle_sell_aircraft(
        &mut self,
        account: AccountId,
        aircraft: AircraftId,
    ) -> Result<SaleReceipt, EngineError> {
        let mut record = self.active_account(account).await?;

        let unit = match self.get(&Key::Aircraft(aircraft)).await {
            Some(Value::Aircraft(unit)) if unit.owner == account => unit,
            _ => return Err(EngineError::AircraftNotFound),
        };
        if unit.status != AircraftStatus::Idle {
            return Err(EngineError::UnitStateConflict);
        }

        let sale_price = unit.purchased_price * RESALE_RATE_BPS / BPS;
        self.record_entry(
            account,
            &mut record,
            sale_price as i64,
            LedgerCategory::AircraftSale,
            format!("aircraft sale: unit {aircraft}"),
            Some(aircraft),
            None,
        )
        .await;
        let new_balance = record.balance;

        let fleet: Vec<u64> = self
            .ids(&Key::Fleet(account))
            .await
            .into_iter()
            .filter(|id| *id != aircraft)
            .collect();
        self.delete(&Key::Aircraft(aircraft)).await;
        self.insert(Key::Fleet(account), Value::Ids(fleet)).await;
        self.insert(Key::Account(account), Value::Account(record))
            .await;

        self.emit(Event::AircraftSold {
            account,
            aircraft,
            sale_price,
            new_balance,
        });
        Ok(SaleReceipt {
            aircraft,
            sale_price,
            new_balance,
        })
    }
}
