use crate::{
    chain::{
        CallArg,
        MoveCall,
        ObjectId,
    },
    config::{
        ConfigError,
        ContractConfig,
        GACHA_PRICE_MIST,
        MODULE_GACHA_GEAR,
        MODULE_GACHA_PET,
        MODULE_GAME_STATE,
        MODULE_RUN_LOGIC,
        MODULE_UPGRADE,
    },
};

/// What the run shop sells. The discriminant is the code the contract expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShopUpgrade {
    PotionHeal = 0,
    PotionCarry = 1,
    TempAtk = 2,
    Potion = 3,
}

impl ShopUpgrade {
    pub const ALL: [ShopUpgrade; 4] = [
        ShopUpgrade::PotionHeal,
        ShopUpgrade::PotionCarry,
        ShopUpgrade::TempAtk,
        ShopUpgrade::Potion,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            ShopUpgrade::PotionHeal => "Potion heal +10",
            ShopUpgrade::PotionCarry => "Potion carry +1",
            ShopUpgrade::TempAtk => "Temp ATK +5",
            ShopUpgrade::Potion => "Buy 1 potion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PullCount {
    One,
    Ten,
}

impl PullCount {
    pub fn count(self) -> u8 {
        match self {
            PullCount::One => 1,
            PullCount::Ten => 10,
        }
    }

    pub fn price_mist(self) -> u64 {
        u64::from(self.count()) * GACHA_PRICE_MIST
    }
}

/// A player-initiated transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreatePlayer,
    StartRun { player: ObjectId },
    Roll { run: ObjectId },
    UsePotion { run: ObjectId },
    ShopBuy { run: ObjectId, upgrade: ShopUpgrade },
    UpgradeGear { items: [ObjectId; 3] },
    PullGear { count: PullCount },
    PullPet { count: PullCount },
}

impl Action {
    /// Only a dice roll has an outcome the client has to work out from state.
    pub fn infers_event(&self) -> bool {
        matches!(self, Action::Roll { .. })
    }

    pub fn is_gacha(&self) -> bool {
        matches!(self, Action::PullGear { .. } | Action::PullPet { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::CreatePlayer => "Create player",
            Action::StartRun { .. } => "Start run",
            Action::Roll { .. } => "Roll dice",
            Action::UsePotion { .. } => "Use potion",
            Action::ShopBuy { .. } => "Shop purchase",
            Action::UpgradeGear { .. } => "Upgrade gear",
            Action::PullGear { .. } => "Gear gacha",
            Action::PullPet { .. } => "Pet gacha",
        }
    }

    pub fn to_move_call(&self, config: &ContractConfig) -> Result<MoveCall, ConfigError> {
        let package = config.package()?;
        let call = |module, function, arguments| MoveCall {
            package,
            module,
            function,
            arguments,
            payment_mist: None,
        };
        let move_call = match *self {
            Action::CreatePlayer => {
                call(MODULE_GAME_STATE, "create_player_and_transfer", vec![])
            }
            Action::StartRun { player } => call(
                MODULE_GAME_STATE,
                "start_run_entry",
                vec![CallArg::Object(player)],
            ),
            Action::Roll { run } => call(
                MODULE_RUN_LOGIC,
                "roll_and_move_entry",
                vec![CallArg::Object(run), CallArg::Object(config.random())],
            ),
            Action::UsePotion { run } => call(
                MODULE_RUN_LOGIC,
                "use_potion_entry",
                vec![CallArg::Object(run)],
            ),
            Action::ShopBuy { run, upgrade } => call(
                MODULE_RUN_LOGIC,
                "shop_buy_entry",
                vec![CallArg::Object(run), CallArg::U8(upgrade.code())],
            ),
            Action::UpgradeGear { items: [a, b, c] } => call(
                MODULE_UPGRADE,
                "upgrade_gear_entry",
                vec![
                    CallArg::Object(a),
                    CallArg::Object(b),
                    CallArg::Object(c),
                    CallArg::Object(config.mint_authority()?),
                ],
            ),
            Action::PullGear { count } => {
                gacha_call(config, package, MODULE_GACHA_GEAR, "pull_gear", count)?
            }
            Action::PullPet { count } => {
                gacha_call(config, package, MODULE_GACHA_PET, "pull_pet", count)?
            }
        };
        Ok(move_call)
    }
}

fn gacha_call(
    config: &ContractConfig,
    package: ObjectId,
    module: &'static str,
    function: &'static str,
    count: PullCount,
) -> Result<MoveCall, ConfigError> {
    Ok(MoveCall {
        package,
        module,
        function,
        arguments: vec![
            CallArg::Object(config.mint_authority()?),
            CallArg::SplitCoin,
            CallArg::U8(count.count()),
            CallArg::Object(config.random()),
        ],
        payment_mist: Some(count.price_mist()),
    })
}
